use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};
use socket2::SockRef;

use super::multiplexer::Multiplexer;
use crate::buffer::BufferPool;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::handshake;

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Blocking accept loop.
///
/// The handshake is done right here, with a single blocking read: a
/// request which does not arrive in one piece is rejected.
pub(super) struct Acceptor {
    pub listener: TcpListener,
    pub running: Arc<AtomicBool>,
    pub handler: Arc<dyn Handler>,
    pub pool: Arc<BufferPool>,
    pub multiplexers: Arc<[Arc<Multiplexer>]>,
    /// Round-robin cursor, shared by all acceptors.
    pub next: Arc<AtomicUsize>,
    pub max_frame_size: usize,
    pub handshake_timeout: Option<Duration>,
}

impl Acceptor {
    pub fn spawn(self, id: usize) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("hivews-acceptor-{}", id))
            .spawn(move || self.run(id))
    }

    fn run(self, id: usize) {
        debug!("acceptor[{}]: start", id);

        while self.running.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if !self.running.load(Ordering::Acquire) {
                        break;
                    }
                    if let Err(e) = self.handle(stream, peer) {
                        warn!("acceptor[{}]: reject {}: {}", id, peer, e);
                    }
                }
                Err(e) => {
                    if !self.running.load(Ordering::Acquire) {
                        break;
                    }
                    warn!("acceptor[{}]: accept: {}", id, e);
                    thread::sleep(ACCEPT_BACKOFF);
                }
            }
        }

        debug!("acceptor[{}]: stop", id);
    }

    fn handle(&self, mut stream: TcpStream, peer: SocketAddr) -> Result<()> {
        debug!("acceptor: new connection from {}", peer);

        stream.set_nodelay(true)?;
        SockRef::from(&stream).set_keepalive(true)?;
        stream.set_read_timeout(self.handshake_timeout)?;

        let mut buf = self.pool.acquire();
        let n = stream.read(buf.write())?;
        if n == 0 {
            self.pool.release(buf);
            return Err(Error::Closed);
        }
        buf.advance_wr_pos(n);

        let ret = handshake::accept(buf.read());
        let accepted = match ret {
            Ok(accepted) => accepted,
            Err(e) => {
                self.pool.release(buf);
                return Err(e.into());
            }
        };

        stream.write_all(accepted.response.as_bytes())?;
        stream.set_read_timeout(None)?;
        stream.set_nonblocking(true)?;

        let conn = Connection::builder(
            mio::net::TcpStream::from_std(stream),
            self.handler.clone(),
            self.pool.clone(),
        )
        .max_frame_size(self.max_frame_size)
        .handshaked(&buf.read()[accepted.consumed..])
        .build();
        self.pool.release(buf);

        self.handler.on_open(&conn);
        if !conn.is_open() {
            return Ok(());
        }

        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.multiplexers.len();
        self.multiplexers[idx].register(conn);
        Ok(())
    }
}
