//! Websocket handshake.
//!
//! The server side of the opening handshake is a pure function of the
//! request header block: find the block, pull out `sec-websocket-key`,
//! derive the accept key and build the `101` response.

pub mod key;
pub mod request;
pub mod response;

pub use key::{create_accept_key, derive_accept_key};
pub use request::{parse_headers, parse_headers_str, Headers};
pub use response::{build_response, encode_response};

use crate::error::HandshakeError;

/// 258EAFA5-E914-47DA-95CA-C5AB0DC85B11
pub const GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// CRLF
pub const HTTP_LINE_BREAK: &[u8] = b"\r\n";

/// CRLF CRLF
pub const HTTP_HEADER_END: &[u8] = b"\r\n\r\n";

/// A colon + one SP is prefered
pub const HTTP_HEADER_SP: &[u8] = b": ";

/// HTTP/1.1 101 Switching Protocols
pub const HTTP_STATUS_LINE: &[u8] = b"HTTP/1.1 101 Switching Protocols";

macro_rules! header {
    (   $(
            $(#[$docs: meta])*
            ($hdr_name: ident => $name: expr);
        )+
    ) => {
        $(
            $(#[$docs])*
            pub const $hdr_name: &[u8] = $name;
        )+
    };
}

/// Static http headers
#[allow(unused)]
pub mod static_headers {
    // header name, as written in the response
    header! {
        (HEADER_UPGRADE_NAME => b"Upgrade");

        (HEADER_CONNECTION_NAME => b"Connection");

        (HEADER_SEC_WEBSOCKET_ACCEPT_NAME => b"Sec-WebSocket-Accept");
    }

    // header value
    header! {
        (HEADER_UPGRADE_VALUE => b"websocket");

        (HEADER_CONNECTION_VALUE => b"Upgrade");
    }

    /// Lookup key of the client key in parsed [`Headers`](super::Headers).
    pub const SEC_WEBSOCKET_KEY: &str = "sec-websocket-key";
}

/// Length of the header block at the front of `buf`, including the
/// terminating CRLF CRLF. `None` if the block is not complete yet.
#[inline]
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HTTP_HEADER_END.len())
        .position(|w| w == HTTP_HEADER_END)
        .map(|i| i + HTTP_HEADER_END.len())
}

/// Outcome of a successful server handshake.
#[derive(Debug)]
pub struct Accepted {
    /// Parsed request headers.
    pub headers: Headers,
    /// Size of the request header block; bytes after it belong to frames.
    pub consumed: usize,
    /// Response to send back.
    pub response: String,
}

/// Run the server handshake against buffered request bytes.
///
/// Returns [`HandshakeError::NotEnoughData`] if the header block is not
/// complete yet, or [`HandshakeError::SecWebSocketKey`] if the client key
/// is missing or empty.
pub fn accept(buf: &[u8]) -> Result<Accepted, HandshakeError> {
    let consumed = find_header_end(buf).ok_or(HandshakeError::NotEnoughData)?;
    let headers = parse_headers(&buf[..consumed]);

    let sec_key = match headers.get(static_headers::SEC_WEBSOCKET_KEY) {
        Some(key) if !key.is_empty() => key,
        _ => return Err(HandshakeError::SecWebSocketKey),
    };

    let response = build_response(&create_accept_key(sec_key));

    Ok(Accepted {
        headers,
        consumed,
        response,
    })
}
