//! Frame opcode.

/// Frame opcode.
///
/// Values outside the six defined by RFC-6455 are kept as
/// [`OpCode::Unknown`], leaving the decision to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// denotes a continuation frame, 0x00
    Continue,
    /// denotes a text frame, 0x01
    Text,
    /// denotes a binary frame, 0x02
    Binary,

    /// denotes a connection close, 0x08
    Close,
    /// denotes a ping, 0x09
    Ping,
    /// denotes a pong, 0x0a
    Pong,

    /// reserved or illegal value
    Unknown(u8),
}

impl OpCode {
    /// Parse from the low 4 bits of a byte.
    #[inline]
    pub const fn from_flag(b: u8) -> Self {
        use OpCode::*;
        match b & 0x0f {
            0x00 => Continue,
            0x01 => Text,
            0x02 => Binary,
            0x08 => Close,
            0x09 => Ping,
            0x0a => Pong,
            x => Unknown(x),
        }
    }

    /// Generate the 4-bit flag.
    #[inline]
    pub const fn to_flag(self) -> u8 {
        use OpCode::*;
        match self {
            Continue => 0x00,
            Text => 0x01,
            Binary => 0x02,
            Close => 0x08,
            Ping => 0x09,
            Pong => 0x0a,
            Unknown(x) => x & 0x0f,
        }
    }

    /// Close, ping, pong and reserved values from 0x08.
    #[inline]
    pub const fn is_control(self) -> bool { self.to_flag() >= 0x08 }
}
