//! Server: acceptor threads in front of a pool of multiplexers.
//!
//! ```text
//!   listener ──> acceptor (accept + handshake)
//!                   │ round robin
//!                   v
//!             multiplexer (poll) ──> executor (read cycle) ──> Handler
//! ```
//!
//! ```no_run
//! use hivews::{Connection, Handler};
//! use hivews::server::{Server, ServerConfig};
//!
//! struct Echo;
//!
//! impl Handler for Echo {
//!     fn on_text(&self, conn: &Connection, text: &str) { let _ = conn.send_text(text); }
//!
//!     fn on_binary(&self, conn: &Connection, data: &[u8]) { let _ = conn.send_binary(data); }
//! }
//!
//! let server = Server::bind(ServerConfig::default(), Echo).unwrap();
//! server.start().unwrap();
//! ```

mod acceptor;
mod config;
mod multiplexer;

pub use config::ServerConfig;

use std::io;
use std::mem;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;
use socket2::{Domain, Protocol, SockRef, Socket, Type};

use crate::buffer::BufferPool;
use crate::handler::Handler;
use crate::task::{Executor, WorkerPool};
use acceptor::Acceptor;
use multiplexer::Multiplexer;

const POKE_TIMEOUT: Duration = Duration::from_millis(100);

enum State {
    Idle,
    Running {
        acceptors: Vec<JoinHandle<()>>,
        multiplexers: Arc<[Arc<Multiplexer>]>,
        /// The default pool, owned by this server.
        workers: Option<Arc<WorkerPool>>,
    },
    Stopped,
}

/// Websocket server.
///
/// Bound on construction, serving after [`start`](Server::start), and
/// stopped by [`stop`](Server::stop) or on drop. A stopped server cannot
/// be started again.
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    handler: Arc<dyn Handler>,
    pool: Arc<BufferPool>,
    executor: Option<Arc<dyn Executor>>,
    running: Arc<AtomicBool>,
    state: Mutex<State>,
}

impl Server {
    /// Bind the listening socket.
    pub fn bind<H: Handler>(config: ServerConfig, handler: H) -> io::Result<Self> {
        let addr = config.socket_addr();
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(config.backlog)?;

        let listener: TcpListener = socket.into();
        let local_addr = listener.local_addr()?;
        info!("server: listening on {}", local_addr);

        Ok(Self {
            config,
            listener,
            local_addr,
            handler: Arc::new(handler),
            pool: Arc::new(BufferPool::new()),
            executor: None,
            running: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(State::Idle),
        })
    }

    /// Run read cycles on `executor` instead of a dedicated [`WorkerPool`].
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Spawn multiplexers and acceptors.
    pub fn start(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        if !matches!(*state, State::Idle) {
            return Err(io::Error::new(io::ErrorKind::Other, "server already started"));
        }

        let (executor, workers) = match &self.executor {
            Some(executor) => (executor.clone(), None),
            None => {
                let workers = Arc::new(WorkerPool::new(self.config.workers)?);
                (workers.clone() as Arc<dyn Executor>, Some(workers))
            }
        };

        self.running.store(true, Ordering::Release);

        let mut multiplexers = Vec::new();
        for id in 0..self.config.multiplexers.max(1) {
            match Multiplexer::spawn(id, executor.clone(), self.config.poll_timeout) {
                Ok(mux) => multiplexers.push(mux),
                Err(e) => {
                    self.running.store(false, Ordering::Release);
                    multiplexers.iter().for_each(|mux| mux.stop());
                    if let Some(workers) = workers {
                        workers.shutdown();
                    }
                    return Err(e);
                }
            }
        }
        let multiplexers: Arc<[Arc<Multiplexer>]> = multiplexers.into();

        let next = Arc::new(AtomicUsize::new(0));
        let mut acceptors = Vec::new();
        let mut spawned = Ok(());
        for id in 0..self.config.acceptors.max(1) {
            let acceptor = self.listener.try_clone().map(|listener| Acceptor {
                listener,
                running: self.running.clone(),
                handler: self.handler.clone(),
                pool: self.pool.clone(),
                multiplexers: multiplexers.clone(),
                next: next.clone(),
                max_frame_size: self.config.max_frame_size,
                handshake_timeout: self.config.handshake_timeout,
            });
            match acceptor.and_then(|acceptor| acceptor.spawn(id)) {
                Ok(handle) => acceptors.push(handle),
                Err(e) => {
                    spawned = Err(e);
                    break;
                }
            }
        }

        *state = State::Running {
            acceptors,
            multiplexers,
            workers,
        };
        drop(state);

        match spawned {
            Ok(()) => {
                info!("server: started on {}", self.local_addr);
                Ok(())
            }
            Err(e) => {
                self.stop();
                Err(e)
            }
        }
    }

    /// Stop accepting, close every connection with 1001, join all threads.
    ///
    /// Read cycles already dispatched are allowed to finish.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        let (acceptors, multiplexers, workers) = match mem::replace(&mut *state, State::Stopped) {
            State::Running {
                acceptors,
                multiplexers,
                workers,
            } => (acceptors, multiplexers, workers),
            _ => return,
        };
        drop(state);

        self.running.store(false, Ordering::Release);

        // wake up the acceptors blocked in accept
        let _ = SockRef::from(&self.listener).shutdown(Shutdown::Both);
        let poke = SocketAddr::new(loopback(self.local_addr.ip()), self.local_addr.port());
        for _ in 0..acceptors.len() {
            let _ = TcpStream::connect_timeout(&poke, POKE_TIMEOUT);
        }
        for handle in acceptors {
            let _ = handle.join();
        }
        debug!("server: acceptors stopped");

        for mux in multiplexers.iter() {
            mux.stop();
        }
        debug!("server: multiplexers stopped");

        if let Some(workers) = workers {
            workers.shutdown();
        }
        info!("server: stopped");
    }

    #[inline]
    pub fn local_addr(&self) -> SocketAddr { self.local_addr }

    #[inline]
    pub fn is_running(&self) -> bool { self.running.load(Ordering::Acquire) }

    /// Connections registered with the multiplexers.
    pub fn connections(&self) -> usize {
        match &*self.state.lock() {
            State::Running { multiplexers, .. } => multiplexers.iter().map(|mux| mux.active()).sum(),
            _ => 0,
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) { self.stop(); }
}

fn loopback(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    }
}
