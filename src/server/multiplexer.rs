use std::collections::HashMap;
use std::io;
use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_queue::SegQueue;
use log::{debug, trace, warn};
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Registry, Token, Waker};
use parking_lot::Mutex;

use crate::connection::Connection;
use crate::frame::close;
use crate::task::Executor;

const WAKER: Token = Token(usize::MAX);

const EVENTS_CAPACITY: usize = 1024;

/// One poll instance and the thread waiting on it.
///
/// A readable connection is deregistered before its read cycle is handed
/// to the executor, and registered again once the cycle is over. Until
/// then no further event can be reported for it, so at most one read
/// cycle per connection is ever in flight.
pub(super) struct Multiplexer {
    id: usize,
    registry: Registry,
    waker: Waker,
    /// Handed over by acceptors, registered by the poll thread.
    pending: SegQueue<Connection>,
    /// Closed after a read cycle, to be forgotten by the poll thread.
    retired: SegQueue<Token>,
    running: AtomicBool,
    active: AtomicUsize,
    executor: Arc<dyn Executor>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Multiplexer {
    pub fn spawn(id: usize, executor: Arc<dyn Executor>, timeout: Duration) -> io::Result<Arc<Self>> {
        let poll = Poll::new()?;
        let registry = poll.registry().try_clone()?;
        let waker = Waker::new(poll.registry(), WAKER)?;

        let mux = Arc::new(Self {
            id,
            registry,
            waker,
            pending: SegQueue::new(),
            retired: SegQueue::new(),
            running: AtomicBool::new(true),
            active: AtomicUsize::new(0),
            executor,
            thread: Mutex::new(None),
        });

        let handle = {
            let mux = mux.clone();
            thread::Builder::new()
                .name(format!("hivews-mux-{}", id))
                .spawn(move || mux.run(poll, timeout))?
        };
        *mux.thread.lock() = Some(handle);

        Ok(mux)
    }

    /// Queue a connection for registration.
    pub fn register(&self, conn: Connection) {
        if !self.running.load(Ordering::Acquire) {
            conn.close(close::GOING_AWAY, "server shutdown");
            return;
        }
        self.pending.push(conn);
        if let Err(e) = self.waker.wake() {
            warn!("mux[{}]: wake: {}", self.id, e);
        }
    }

    /// Connections currently owned by this multiplexer.
    #[inline]
    pub fn active(&self) -> usize { self.active.load(Ordering::Relaxed) }

    /// Leave the loop, close the remaining connections, join the thread.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let _ = self.waker.wake();

        if let Some(handle) = self.thread.lock().take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }

    fn run(self: Arc<Self>, mut poll: Poll, timeout: Duration) {
        debug!("mux[{}]: start", self.id);

        let mut events = Events::with_capacity(EVENTS_CAPACITY);
        let mut conns: HashMap<Token, Connection> = HashMap::new();
        let mut next_token = 0_usize;

        while self.running.load(Ordering::Acquire) {
            while let Some(token) = self.retired.pop() {
                if let Some(conn) = conns.remove(&token) {
                    trace!("mux[{}]: retire conn[{}]", self.id, conn.id());
                }
            }

            while let Some(conn) = self.pending.pop() {
                let token = Token(next_token);
                next_token = (next_token + 1) % WAKER.0;
                self.adopt(token, conn.clone());
                conns.insert(token, conn);
            }

            self.active.store(conns.len(), Ordering::Relaxed);

            if let Err(e) = poll.poll(&mut events, Some(timeout)) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                warn!("mux[{}]: poll: {}", self.id, e);
                break;
            }

            for event in events.iter() {
                let token = event.token();
                if token == WAKER {
                    continue;
                }
                if let Some(conn) = conns.get(&token) {
                    self.dispatch(token, conn.clone());
                }
            }
        }

        for (_, conn) in conns.drain() {
            conn.close(close::GOING_AWAY, "server shutdown");
        }
        while let Some(conn) = self.pending.pop() {
            conn.close(close::GOING_AWAY, "server shutdown");
        }
        self.active.store(0, Ordering::Relaxed);

        debug!("mux[{}]: stop", self.id);
    }

    /// Take over a new connection. Bytes already buffered by the acceptor
    /// get a read cycle right away, since no event will announce them.
    fn adopt(self: &Arc<Self>, token: Token, conn: Connection) {
        debug!("mux[{}]: register conn[{}] as {:?}", self.id, conn.id(), token);

        if conn.has_pending() {
            self.submit(token, conn);
            return;
        }
        let fd = conn.as_raw_fd();
        if let Err(e) = self
            .registry
            .register(&mut SourceFd(&fd), token, Interest::READABLE)
        {
            conn.fail(e.into());
            self.retired.push(token);
        }
    }

    fn dispatch(self: &Arc<Self>, token: Token, conn: Connection) {
        let fd = conn.as_raw_fd();
        if let Err(e) = self.registry.deregister(&mut SourceFd(&fd)) {
            // already handed to a read cycle
            trace!("mux[{}]: deregister conn[{}]: {}", self.id, conn.id(), e);
            return;
        }
        self.submit(token, conn);
    }

    fn submit(self: &Arc<Self>, token: Token, conn: Connection) {
        let mux = self.clone();
        self.executor.execute(Box::new(move || {
            conn.read_cycle();

            if conn.is_open() {
                let fd = conn.as_raw_fd();
                if let Err(e) = mux
                    .registry
                    .register(&mut SourceFd(&fd), token, Interest::READABLE)
                {
                    conn.fail(e.into());
                }
            }
            if !conn.is_open() {
                mux.retired.push(token);
            }

            let _ = mux.waker.wake();
        }));
    }
}
