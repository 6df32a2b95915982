#![allow(missing_docs)]
//! Errors

mod frame;
mod handshake;

pub use frame::FrameError;
pub use handshake::HandshakeError;

use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum Error {
    Frame(FrameError),

    Handshake(HandshakeError),

    Io(std::io::Error),

    /// The connection has already gone through its close transition.
    Closed,
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self { Error::Frame(e) }
}

impl From<HandshakeError> for Error {
    fn from(e: HandshakeError) -> Self { Error::Handshake(e) }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error { Error::Io(e) }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        use std::io::ErrorKind;
        match e {
            Error::Io(e) => e,
            Error::Closed => ErrorKind::NotConnected.into(),
            e => std::io::Error::new(ErrorKind::InvalidData, e),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Error::*;
        match self {
            Frame(e) => write!(f, "Frame error: {}", e),
            Handshake(e) => write!(f, "Handshake error: {}", e),
            Io(e) => write!(f, "Io error: {}", e),
            Closed => write!(f, "Connection closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;

        match self {
            Frame(e) => Some(e),
            Handshake(e) => Some(e),
            Io(e) => Some(e),
            Closed => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn error_source() {
        let e = Error::from(HandshakeError::SecWebSocketKey);
        assert_eq!(
            e.to_string(),
            "Handshake error: Missing sec-websocket-key header"
        );
        assert!(e.source().is_some());
        assert!(Error::Closed.source().is_none());
    }

    #[test]
    fn into_io_error() {
        use std::io::ErrorKind;

        let e: std::io::Error = Error::Closed.into();
        assert_eq!(e.kind(), ErrorKind::NotConnected);

        let e: std::io::Error = Error::from(FrameError::TooLarge(1 << 30)).into();
        assert_eq!(e.kind(), ErrorKind::InvalidData);
    }
}
