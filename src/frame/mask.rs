//!  Mask flag and key.

/// Payload mask with a 32-bit key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mask {
    Key([u8; 4]),
    None,
}

impl Mask {
    /// Read the flag which indicates whether mask is used.
    /// The key itself follows the length field, so a set flag
    /// yields an all-zero placeholder key.
    #[inline]
    pub const fn from_flag(b: u8) -> Self {
        match b & 0x80 {
            0x80 => Mask::Key([0; 4]),
            _ => Mask::None,
        }
    }

    /// Get the flag byte.
    #[inline]
    pub const fn to_flag(&self) -> u8 {
        match self {
            Mask::Key(_) => 0x80,
            Mask::None => 0x00,
        }
    }

    #[inline]
    pub const fn is_masked(&self) -> bool { matches!(self, Mask::Key(_)) }

    #[inline]
    pub const fn key(&self) -> Option<[u8; 4]> {
        match self {
            Mask::Key(k) => Some(*k),
            Mask::None => None,
        }
    }
}

/// Mask the buffer, byte by byte.
#[inline]
pub fn apply_mask(key: [u8; 4], buf: &mut [u8]) {
    for (i, b) in buf.iter_mut().enumerate() {
        *b ^= key[i & 0x03];
    }
}

/// Mask the buffer, 4 bytes at a time.
#[inline]
pub fn apply_mask4(key: [u8; 4], buf: &mut [u8]) {
    let key4 = u32::from_ne_bytes(key);

    // SAFETY: any bit pattern is a valid u32.
    let (prefix, middle, suffix) = unsafe { buf.align_to_mut::<u32>() };

    apply_mask(key, prefix);

    let head = prefix.len() & 3;
    let key4 = if head > 0 {
        if cfg!(target_endian = "big") {
            key4.rotate_left(8 * head as u32)
        } else {
            key4.rotate_right(8 * head as u32)
        }
    } else {
        key4
    };
    for b4 in middle.iter_mut() {
        *b4 ^= key4;
    }

    apply_mask(key4.to_ne_bytes(), suffix);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mask_flag() {
        for v in [0x00, 0x80] {
            assert_eq!(Mask::from_flag(v).to_flag(), v);
        }
        assert!(Mask::from_flag(0xfe).is_masked());
        assert_eq!(Mask::from_flag(0x7f), Mask::None);
    }

    #[test]
    fn mask_byte() {
        let key: [u8; 4] = rand::random();
        let buf: Vec<u8> = (0..1024).map(|_| rand::random::<u8>()).collect();

        let mut buf2 = buf.clone();
        apply_mask(key, &mut buf2);
        apply_mask(key, &mut buf2);

        assert_eq!(buf, buf2);
    }

    #[test]
    fn mask_byte4() {
        for i in 0..4096 {
            let key: [u8; 4] = rand::random();
            let buf: Vec<u8> = (0..i).map(|_| rand::random::<u8>()).collect();

            let mut buf2 = buf.clone();
            let mut buf3 = buf.clone();
            apply_mask4(key, &mut buf2);
            apply_mask(key, &mut buf3);
            assert_eq!(buf2, buf3);

            apply_mask4(key, &mut buf2);
            assert_eq!(buf, buf2);
        }
    }

    #[test]
    fn mask_unaligned() {
        let key = [0x11, 0x22, 0x33, 0x44];
        let data: Vec<u8> = (0..64).collect();
        for offset in 0..8 {
            let mut a = data.clone();
            let mut b = data.clone();
            apply_mask4(key, &mut a[offset..]);
            apply_mask(key, &mut b[offset..]);
            assert_eq!(a, b);
        }
    }
}
