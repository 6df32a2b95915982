//! Byte transform between the socket and the frame codec.
//!
//! A TLS engine plugs in here: inbound ciphertext is `unwrap`ped to
//! plaintext before it reaches the codec, outbound frames are `wrap`ped
//! before they reach the socket.

use std::io::Result;

/// Bidirectional byte-stream transform.
pub trait Transform: Send {
    /// Turn bytes received from the peer into plaintext, appended to `out`.
    /// It is fine to consume input without producing output.
    fn unwrap(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()>;

    /// Turn plaintext into bytes for the peer, appended to `out`.
    fn wrap(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()>;
}

/// Identity transform.
#[derive(Debug, Default, Clone, Copy)]
pub struct Plain;

impl Transform for Plain {
    #[inline]
    fn unwrap(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(input);
        Ok(())
    }

    #[inline]
    fn wrap(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(input);
        Ok(())
    }
}
