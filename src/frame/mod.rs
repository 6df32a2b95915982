//! Websocket data frame.
//!
//! [RFC-6455 Section5](https://datatracker.ietf.org/doc/html/rfc6455#section-5)
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |     Extended payload length continued, if payload len == 127  |
//! + - - - - - - - - - - - - - - - +-------------------------------+
//! |                               |Masking-key, if MASK set to 1  |
//! +-------------------------------+-------------------------------+
//! | Masking-key (continued)       |          Payload Data         |
//! +-------------------------------- - - - - - - - - - - - - - - - +
//! :                     Payload Data continued ...                :
//! + - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - +
//! |                     Payload Data continued ...                |
//! +---------------------------------------------------------------+
//! ```
//!

pub mod close;
pub mod length;
pub mod mask;
pub mod opcode;

pub use length::PayloadLen;
pub use mask::Mask;
pub use opcode::OpCode;

use crate::buffer::{Buffer, BufferPool};
use crate::error::FrameError;
use mask::apply_mask4;

/// Websocket frame head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHead {
    pub fin: bool,
    pub opcode: OpCode,
    pub mask: Mask,
    pub length: PayloadLen,
}

impl FrameHead {
    /// Constructor.
    #[inline]
    pub const fn new(fin: bool, opcode: OpCode, mask: Mask, length: PayloadLen) -> Self {
        Self {
            fin,
            opcode,
            mask,
            length,
        }
    }

    /// Encoded size of this head: 2, 4 or 10 bytes, plus 4 if masked.
    #[allow(clippy::len_without_is_empty)]
    #[inline]
    pub const fn len(&self) -> usize {
        2 + self.length.ext_len() + if self.mask.is_masked() { 4 } else { 0 }
    }

    /// Encode to provided buffer, returns the count of written bytes.
    /// The caller should ensure the buffer is large enough,
    /// otherwise a [`FrameError::NotEnoughCapacity`] error will be returned.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, FrameError> {
        let n = self.len();
        if buf.len() < n {
            return Err(FrameError::NotEnoughCapacity);
        }

        // fin, opcode
        buf[0] = if self.fin { 0x80 } else { 0x00 } | self.opcode.to_flag();

        // mask, payload length
        buf[1] = self.mask.to_flag() | self.length.to_flag();

        // extended payload length
        let mut pos = 2;
        match self.length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(v) => {
                buf[pos..pos + 2].copy_from_slice(&v.to_be_bytes());
                pos += 2;
            }
            PayloadLen::Extended2(v) => {
                buf[pos..pos + 8].copy_from_slice(&v.to_be_bytes());
                pos += 8;
            }
        };

        // mask key
        if let Mask::Key(k) = self.mask {
            buf[pos..pos + 4].copy_from_slice(&k);
        }

        Ok(n)
    }

    /// Parse from provided buffer, returns [`FrameHead`] and the count of read bytes
    /// if the parse succeeds.
    /// If there is not enough data to parse, a [`FrameError::NotEnoughData`] error
    /// will be returned.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), FrameError> {
        if buf.len() < 2 {
            return Err(FrameError::NotEnoughData);
        }

        let mut n: usize = 2;

        let b1 = buf[0];
        let b2 = buf[1];

        let fin = b1 & 0x80 != 0;
        let opcode = OpCode::from_flag(b1);
        let mut mask = Mask::from_flag(b2);
        let mut length = PayloadLen::from_flag(b2);

        match length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(_) => {
                let ext = buf.get(2..4).ok_or(FrameError::NotEnoughData)?;
                length = PayloadLen::from_byte2([ext[0], ext[1]]);
                n += 2;
            }
            PayloadLen::Extended2(_) => {
                let ext = buf.get(2..10).ok_or(FrameError::NotEnoughData)?;
                let mut b8 = [0_u8; 8];
                b8.copy_from_slice(ext);
                length = PayloadLen::from_byte8(b8);
                n += 8;
            }
        };

        if mask.is_masked() {
            let k = buf.get(n..n + 4).ok_or(FrameError::NotEnoughData)?;
            mask = Mask::Key([k[0], k[1], k[2], k[3]]);
            n += 4;
        }

        Ok((
            FrameHead {
                fin,
                opcode,
                mask,
                length,
            },
            n,
        ))
    }
}

/// One decoded or to-be-encoded frame.
///
/// The payload borrows the buffer it was decoded from; a masked payload
/// has already been unmasked in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub fin: bool,
    pub opcode: OpCode,
    pub mask: Mask,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Constructor.
    #[inline]
    pub const fn new(fin: bool, opcode: OpCode, mask: Mask, payload: &'a [u8]) -> Self {
        Self {
            fin,
            opcode,
            mask,
            payload,
        }
    }

    /// Unmasked final text frame.
    #[inline]
    pub const fn text(text: &'a str) -> Self {
        Self::new(true, OpCode::Text, Mask::None, text.as_bytes())
    }

    /// Unmasked final binary frame.
    #[inline]
    pub const fn binary(data: &'a [u8]) -> Self { Self::new(true, OpCode::Binary, Mask::None, data) }

    /// Unmasked control frame.
    #[inline]
    pub const fn control(opcode: OpCode, payload: &'a [u8]) -> Self {
        Self::new(true, opcode, Mask::None, payload)
    }

    #[inline]
    pub const fn is_masked(&self) -> bool { self.mask.is_masked() }

    #[inline]
    pub const fn masking_key(&self) -> Option<[u8; 4]> { self.mask.key() }

    /// Head describing this frame.
    #[inline]
    pub const fn head(&self) -> FrameHead {
        FrameHead::new(
            self.fin,
            self.opcode,
            self.mask,
            PayloadLen::from_num(self.payload.len() as u64),
        )
    }

    /// Try to parse one frame from the readable part of `buf`.
    ///
    /// Returns `None` if the buffer does not hold a complete frame yet; the
    /// read cursor is left untouched in that case, so the call can simply
    /// be repeated once more bytes arrive. On success the read cursor is
    /// moved past the frame.
    pub fn decode(buf: &'a mut Buffer) -> Option<Frame<'a>> {
        let (head, n) = FrameHead::decode(buf.read()).ok()?;

        let len = head.length.to_num();
        if ((buf.rd_left() - n) as u64) < len {
            return None;
        }
        let len = len as usize;

        let beg = buf.rd_pos() + n;
        buf.advance_rd_pos(n + len);

        let payload = &mut buf.as_mut()[beg..beg + len];
        if let Mask::Key(key) = head.mask {
            apply_mask4(key, payload);
        }

        Some(Frame {
            fin: head.fin,
            opcode: head.opcode,
            mask: head.mask,
            payload,
        })
    }

    /// Serialize into a block taken from `pool`, sized to head + payload.
    /// The payload is masked on the way if a key is set.
    ///
    /// The caller owns the returned block and should hand it back with
    /// [`BufferPool::release`] once the bytes are sent.
    pub fn encode(&self, pool: &BufferPool) -> Result<Buffer, FrameError> {
        let head = self.head();
        let total = head.len() + self.payload.len();

        let mut buf = pool.allocate(total);
        let n = head.encode(buf.write())?;
        buf.advance_wr_pos(n);

        let beg = buf.wr_pos();
        if buf.put(self.payload) != self.payload.len() {
            return Err(FrameError::NotEnoughCapacity);
        }

        if let Mask::Key(key) = self.mask {
            apply_mask4(key, &mut buf.as_mut()[beg..beg + self.payload.len()]);
        }

        Ok(buf)
    }
}

/// Length of the complete frame at the front of `buf`, as soon as its
/// head is readable.
#[inline]
pub fn peek_frame_len(buf: &[u8]) -> Option<(FrameHead, u64)> {
    let (head, n) = FrameHead::decode(buf).ok()?;
    Some((head, n as u64 + head.length.to_num()))
}
