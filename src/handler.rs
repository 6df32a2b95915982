//! Application callbacks.

use std::sync::Arc;

use crate::connection::Connection;
use crate::error::Error;

/// Callbacks invoked by a [`Connection`].
///
/// One handler is shared by every connection of a server, and is called
/// from whichever worker thread runs a connection's read cycle. Calls for
/// the same connection never overlap, except `on_close`/`on_error`, which
/// may also be triggered by another thread closing the connection.
pub trait Handler: Send + Sync + 'static {
    /// Handshake completed.
    fn on_open(&self, _conn: &Connection) {}

    /// A complete text message.
    fn on_text(&self, conn: &Connection, text: &str);

    /// A complete binary message.
    fn on_binary(&self, conn: &Connection, data: &[u8]);

    /// Called exactly once per connection.
    fn on_close(&self, _conn: &Connection, _code: u16, _reason: &str) {}

    /// An I/O or protocol failure, always followed by `on_close`.
    fn on_error(&self, _conn: &Connection, _err: &Error) {}
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn on_open(&self, conn: &Connection) { (**self).on_open(conn) }

    fn on_text(&self, conn: &Connection, text: &str) { (**self).on_text(conn, text) }

    fn on_binary(&self, conn: &Connection, data: &[u8]) { (**self).on_binary(conn, data) }

    fn on_close(&self, conn: &Connection, code: u16, reason: &str) {
        (**self).on_close(conn, code, reason)
    }

    fn on_error(&self, conn: &Connection, err: &Error) { (**self).on_error(conn, err) }
}
