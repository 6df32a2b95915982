//! Websocket server engine for huge numbers of concurrent connections.
//!
//! ## Features
//! - A few OS threads serve many thousands of sockets.
//! - Pooled buffers, no per-message allocation on the hot path.
//! - At most one read cycle in flight per connection.
//! - Pluggable byte transform (TLS) and task executor.
//!
//! ## High-level API
//!
//! - [`server`]
//! - [`handler`]
//! - [`connection`]
//!
//! ```ignore
//! {
//!     // serve
//!     let server = Server::bind(ServerConfig::default(), handler)?;
//!     server.start()?;
//!     // within a callback
//!     conn.send_text("hello")?;
//!     conn.close(close::NORMAL, "bye");
//! }
//! ```
//!
//! ## Low-level API
//!
//! - [`frame`]
//! - [`handshake`]
//! - [`buffer`]
//!
//! Frame:
//!
//! ```ignore
//! {
//!     // encode a frame
//!     let buf = Frame::text("hello").encode(&pool)?;
//!
//!     // decode a frame, None if incomplete
//!     let frame = Frame::decode(&mut buf).unwrap();
//! }
//! ```
//!
//! Handshake:
//!
//! ```ignore
//! {
//!     // answer an upgrade request
//!     let accepted = handshake::accept(&request)?;
//!     stream.write_all(accepted.response.as_bytes())?;
//! }
//! ```

pub mod buffer;
pub mod connection;
pub mod error;
pub mod frame;
pub mod handler;
pub mod handshake;
pub mod task;
pub mod transform;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        pub mod server;
        pub use server::{Server, ServerConfig};
    }
}

pub use connection::Connection;
pub use error::{Error, Result};
pub use handler::Handler;
pub use transform::Transform;
