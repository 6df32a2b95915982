/// Heap block with a read and a write cursor.
///
/// Bytes in `[rd, wr)` are readable, bytes in `[wr, cap)` are writable.
#[derive(Debug)]
pub struct Buffer {
    rd: usize,
    wr: usize,
    buf: Box<[u8]>,
}

impl Buffer {
    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            rd: 0,
            wr: 0,
            buf: vec![0; cap].into_boxed_slice(),
        }
    }

    /// Allocate a block which holds exactly `data`.
    #[inline]
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            rd: 0,
            wr: data.len(),
            buf: Box::from(data),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize { self.buf.len() }

    #[inline]
    pub const fn rd_pos(&self) -> usize { self.rd }

    #[inline]
    pub const fn wr_pos(&self) -> usize { self.wr }

    #[inline]
    pub fn set_rd_pos(&mut self, n: usize) {
        debug_assert!(n <= self.wr);
        self.rd = n
    }

    #[inline]
    pub fn advance_rd_pos(&mut self, n: usize) {
        debug_assert!(self.rd + n <= self.wr);
        self.rd += n
    }

    #[inline]
    pub fn advance_wr_pos(&mut self, n: usize) {
        debug_assert!(self.wr + n <= self.buf.len());
        self.wr += n
    }

    #[inline]
    pub const fn rd_left(&self) -> usize { self.wr - self.rd }

    #[inline]
    pub fn wr_left(&self) -> usize { self.buf.len() - self.wr }

    #[inline]
    pub const fn is_empty(&self) -> bool { self.rd == self.wr }

    /// Readable bytes.
    #[inline]
    pub fn read(&self) -> &[u8] { &self.buf[self.rd..self.wr] }

    /// Readable bytes, mutable.
    #[inline]
    pub fn read_mut(&mut self) -> &mut [u8] { &mut self.buf[self.rd..self.wr] }

    /// Writable space.
    #[inline]
    pub fn write(&mut self) -> &mut [u8] { &mut self.buf[self.wr..] }

    /// Append `data` after the write cursor.
    /// Returns the number of copied bytes, which is less than `data.len()`
    /// if there is not enough space.
    #[inline]
    pub fn put(&mut self, data: &[u8]) -> usize {
        let n = std::cmp::min(data.len(), self.wr_left());
        self.buf[self.wr..self.wr + n].copy_from_slice(&data[..n]);
        self.wr += n;
        n
    }

    #[inline]
    pub fn reset(&mut self) {
        self.rd = 0;
        self.wr = 0;
    }

    #[cfg(test)]
    #[inline]
    pub(crate) fn as_ptr(&self) -> *const u8 { self.buf.as_ptr() }
}

/// Get the whole block.
impl AsRef<[u8]> for Buffer {
    #[inline]
    fn as_ref(&self) -> &[u8] { &self.buf }
}

/// Get the whole block.
impl AsMut<[u8]> for Buffer {
    #[inline]
    fn as_mut(&mut self) -> &mut [u8] { &mut self.buf }
}
