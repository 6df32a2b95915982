//! Websocket connection.
//!
//! A [`Connection`] is a cheap, clonable handle to the state of one
//! accepted socket. It goes through `pending handshake -> open -> closed`
//! exactly once:
//!
//! - the read cycle ([`Connection::read_cycle`]) is driven by a multiplexer,
//!   one cycle at a time;
//! - [`send_text`](Connection::send_text), [`send_binary`](Connection::send_binary)
//!   and [`close`](Connection::close) may be called from any thread.

mod read;
mod state;
mod write;

use std::fmt;
use std::net::{Shutdown, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use mio::net::TcpStream;
use parking_lot::Mutex;

use crate::buffer::BufferPool;
use crate::error::{Error, FrameError, Result};
use crate::frame::{close, Frame, OpCode};
use crate::handler::Handler;
use crate::transform::Transform;
use state::ReadState;

/// 16 MiB
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Largest payload of a control frame.
const MAX_CONTROL_PAYLOAD: usize = 125;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to one websocket connection.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

struct Inner {
    id: u64,
    stream: TcpStream,
    peer: Option<SocketAddr>,
    open: AtomicBool,
    handshaked: AtomicBool,
    read_state: Mutex<ReadState>,
    write_lock: Mutex<()>,
    transform: Option<Mutex<Box<dyn Transform>>>,
    handler: Arc<dyn Handler>,
    pool: Arc<BufferPool>,
    max_frame_size: usize,
}

/// Build a [`Connection`] around a non-blocking stream.
pub struct Builder {
    stream: TcpStream,
    handler: Arc<dyn Handler>,
    pool: Arc<BufferPool>,
    transform: Option<Box<dyn Transform>>,
    handshaked: bool,
    carry: Vec<u8>,
    max_frame_size: usize,
}

impl Builder {
    /// Put a transform (e.g. TLS) between the socket and the codec.
    pub fn transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Frames declaring a larger payload close the connection with 1009.
    pub fn max_frame_size(mut self, n: usize) -> Self {
        self.max_frame_size = n;
        self
    }

    /// The handshake has already been done elsewhere; `leftover` holds
    /// bytes read past the request header block.
    pub fn handshaked(mut self, leftover: &[u8]) -> Self {
        self.handshaked = true;
        self.carry = leftover.to_vec();
        self
    }

    pub fn build(self) -> Connection {
        let peer = self.stream.peer_addr().ok();
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        debug!("conn[{}]: new connection from {:?}", id, peer);

        Connection {
            inner: Arc::new(Inner {
                id,
                stream: self.stream,
                peer,
                open: AtomicBool::new(true),
                handshaked: AtomicBool::new(self.handshaked),
                read_state: Mutex::new(ReadState::new(self.carry)),
                write_lock: Mutex::new(()),
                transform: self.transform.map(Mutex::new),
                handler: self.handler,
                pool: self.pool,
                max_frame_size: self.max_frame_size,
            }),
        }
    }
}

impl Connection {
    /// Start building a connection which still expects the upgrade request.
    pub fn builder(stream: TcpStream, handler: Arc<dyn Handler>, pool: Arc<BufferPool>) -> Builder {
        Builder {
            stream,
            handler,
            pool,
            transform: None,
            handshaked: false,
            carry: Vec::new(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Process-unique id.
    #[inline]
    pub fn id(&self) -> u64 { self.inner.id }

    #[inline]
    pub fn is_open(&self) -> bool { self.inner.open.load(Ordering::Acquire) }

    #[inline]
    pub fn is_handshaked(&self) -> bool { self.inner.handshaked.load(Ordering::Acquire) }

    /// Peer address, captured when the connection was created.
    #[inline]
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.inner.peer }

    /// Send a text message. Ignored if the connection is closed.
    pub fn send_text(&self, text: &str) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        self.write_frame(&Frame::text(text))
    }

    /// Send a binary message. Ignored if the connection is closed.
    pub fn send_binary(&self, data: &[u8]) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        self.write_frame(&Frame::binary(data))
    }

    /// Send a ping; the payload is limited to 125 bytes.
    pub fn send_ping(&self, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_CONTROL_PAYLOAD {
            return Err(FrameError::TooLarge(payload.len() as u64).into());
        }
        if !self.is_open() {
            return Ok(());
        }
        self.write_frame(&Frame::control(OpCode::Ping, payload))
    }

    /// Close the connection.
    ///
    /// Only the first call has an effect: it sends a close frame carrying
    /// `code` and `reason` (best effort), calls [`Handler::on_close`] and
    /// shuts the socket down. `reason` is cut to fit in a control frame.
    pub fn close(&self, code: u16, reason: &str) {
        if self
            .inner
            .open
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        debug!("conn[{}]: close {} {}", self.id(), code, reason);

        // 1006 is reserved for "no close frame", and before the upgrade
        // there is no websocket to send one on
        if self.is_handshaked() && code != close::ABNORMAL {
            let payload = close::encode_payload(code, truncate(reason, MAX_CONTROL_PAYLOAD - 2));
            if let Err(e) = self.write_frame(&Frame::control(OpCode::Close, &payload)) {
                debug!("conn[{}]: failed to send close frame: {}", self.id(), e);
            }
        }

        self.inner.handler.on_close(self, code, reason);

        let _ = self.inner.stream.shutdown(Shutdown::Both);
    }

    /// Report a failure to the handler, then close with a code matching it.
    pub(crate) fn fail(&self, err: Error) {
        if !self.is_open() {
            return;
        }
        debug!("conn[{}]: {}", self.id(), err);

        self.inner.handler.on_error(self, &err);

        let code = match err {
            Error::Frame(FrameError::TooLarge(_)) => close::MESSAGE_TOO_BIG,
            _ => close::ABNORMAL,
        };
        self.close(code, &err.to_string());
    }

    /// Undecoded bytes are waiting for the next read cycle.
    pub(crate) fn has_pending(&self) -> bool {
        self.inner
            .read_state
            .try_lock()
            .map_or(false, |state| !state.carry.is_empty())
    }

    #[inline]
    pub(crate) fn handler(&self) -> &dyn Handler { &*self.inner.handler }

    #[inline]
    pub(crate) fn pool(&self) -> &BufferPool { &self.inner.pool }
}

/// Longest prefix of `s` within `max` bytes, on a char boundary.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(unix)]
impl std::os::unix::io::AsRawFd for Connection {
    fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
        std::os::unix::io::AsRawFd::as_raw_fd(&self.inner.stream)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.inner.id)
            .field("peer", &self.inner.peer)
            .field("open", &self.is_open())
            .field("handshaked", &self.is_handshaked())
            .finish()
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }
}

impl Eq for Connection {}
