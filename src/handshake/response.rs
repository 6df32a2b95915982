//! Server handshake.
//!
//! From [RFC-6455 Section 4.2](https://datatracker.ietf.org/doc/html/rfc6455#section-4.2):
//!
//! If the server chooses to accept the incoming connection, it MUST
//! reply with a valid HTTP response.
//!
//! Example:
//!
//! ```text
//! HTTP/1.1 101 Switching Protocols
//! Upgrade: websocket
//! Connection: Upgrade
//! Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=
//! ```
//!

use super::static_headers::*;
use super::{HTTP_HEADER_SP, HTTP_LINE_BREAK, HTTP_STATUS_LINE};
use crate::error::HandshakeError;

/// Build the `101 Switching Protocols` response, including the final empty line.
pub fn build_response(accept_key: &str) -> String {
    String::from_utf8_lossy(&parts(accept_key).concat()).into_owned()
}

/// Encode the response to a provided buffer, return the number of written bytes.
///
/// Caller should make sure the buffer is large enough,
/// otherwise a [`HandshakeError::NotEnoughCapacity`] error will be returned.
pub fn encode_response(accept_key: &str, buf: &mut [u8]) -> Result<usize, HandshakeError> {
    let total = response_len(accept_key);
    if buf.len() < total {
        return Err(HandshakeError::NotEnoughCapacity);
    }

    let mut pos = 0;
    for part in parts(accept_key) {
        buf[pos..pos + part.len()].copy_from_slice(part);
        pos += part.len();
    }
    Ok(pos)
}

#[inline]
fn response_len(accept_key: &str) -> usize { parts(accept_key).iter().map(|p| p.len()).sum() }

#[inline]
fn parts(accept_key: &str) -> [&[u8]; 14] {
    [
        // HTTP/1.1 101 Switching Protocols
        HTTP_STATUS_LINE,
        HTTP_LINE_BREAK,
        // Upgrade: websocket
        HEADER_UPGRADE_NAME,
        HTTP_HEADER_SP,
        HEADER_UPGRADE_VALUE,
        HTTP_LINE_BREAK,
        // Connection: Upgrade
        HEADER_CONNECTION_NAME,
        HTTP_HEADER_SP,
        HEADER_CONNECTION_VALUE,
        HTTP_LINE_BREAK,
        // Sec-WebSocket-Accept: {accept_key}
        HEADER_SEC_WEBSOCKET_ACCEPT_NAME,
        HTTP_HEADER_SP,
        accept_key.as_bytes(),
        // finish with CRLF CRLF
        b"\r\n\r\n",
    ]
}
