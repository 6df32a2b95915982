//! Key exchange.

use super::GUID;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha1::{Digest, Sha1};

/// Derive `sec-websocket-accept` from `sec-websocket-key`.
///
/// base64(sha1(key + GUID))
#[inline]
pub fn derive_accept_key(sec_key: &[u8]) -> String {
    let mut sha1 = Sha1::default();
    sha1.update(sec_key);
    sha1.update(GUID);
    STANDARD.encode(sha1.finalize())
}

/// Same as [`derive_accept_key`], taking the key as text.
#[inline]
pub fn create_accept_key(client_key: &str) -> String { derive_accept_key(client_key.as_bytes()) }
