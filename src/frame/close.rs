//! Close frame payload.
//!
//! [RFC-6455 Section 5.5.1](https://datatracker.ietf.org/doc/html/rfc6455#section-5.5.1)

/// 1000, normal closure
pub const NORMAL: u16 = 1000;

/// 1001, endpoint is going away
pub const GOING_AWAY: u16 = 1001;

/// 1002, protocol error
pub const PROTOCOL_ERROR: u16 = 1002;

/// 1006, closed without a close frame, never sent on the wire
pub const ABNORMAL: u16 = 1006;

/// 1009, message too big to process
pub const MESSAGE_TOO_BIG: u16 = 1009;

/// Build a close payload: 2-byte big-endian code, then the utf-8 reason.
pub fn encode_payload(code: u16, reason: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(2 + reason.len());
    payload.extend_from_slice(&code.to_be_bytes());
    payload.extend_from_slice(reason.as_bytes());
    payload
}

/// Split a close payload into code and reason.
///
/// An empty payload carries no status, which is reported as `None`.
pub fn decode_payload(payload: &[u8]) -> Option<(u16, String)> {
    if payload.len() < 2 {
        return None;
    }
    let code = u16::from_be_bytes([payload[0], payload[1]]);
    let reason = String::from_utf8_lossy(&payload[2..]).into_owned();
    Some((code, reason))
}
