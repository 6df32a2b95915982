use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum HandshakeError {
    // read
    NotEnoughData,

    // write
    NotEnoughCapacity,

    // websocket error
    SecWebSocketKey,
}

impl Display for HandshakeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use HandshakeError::*;
        match self {
            NotEnoughData => write!(f, "Incomplete http header block"),

            NotEnoughCapacity => write!(f, "Not enough space to write to"),

            SecWebSocketKey => write!(f, "Missing sec-websocket-key header"),
        }
    }
}

impl std::error::Error for HandshakeError {}
