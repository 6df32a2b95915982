use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::thread;
use std::time::Duration;

use crate::connection::DEFAULT_MAX_FRAME_SIZE;

/// Server settings.
///
/// ```
/// use hivews::server::ServerConfig;
///
/// let config = ServerConfig::default().port(0).acceptors(1).multiplexers(2);
/// assert_eq!(config.multiplexers, 2);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub addr: IpAddr,
    pub port: u16,
    /// Listen backlog.
    pub backlog: i32,
    /// Accept threads.
    pub acceptors: usize,
    /// Multiplexer threads, each with its own poll instance.
    pub multiplexers: usize,
    /// Threads of the default worker pool.
    pub workers: usize,
    /// Largest accepted frame payload.
    pub max_frame_size: usize,
    /// Upper bound of a multiplexer's wait for readiness.
    pub poll_timeout: Duration,
    /// Read timeout of the acceptor's handshake read. `None` blocks.
    pub handshake_timeout: Option<Duration>,
}

fn parallelism() -> usize { thread::available_parallelism().map_or(1, |n| n.get()) }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8081,
            backlog: 65535,
            acceptors: 2,
            multiplexers: parallelism(),
            workers: parallelism() * 4,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            poll_timeout: Duration::from_millis(500),
            handshake_timeout: Some(Duration::from_secs(10)),
        }
    }
}

macro_rules! setter {
    ($($(#[$doc:meta])* $name: ident: $ty: ty;)+) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(mut self, $name: $ty) -> Self {
                self.$name = $name;
                self
            }
        )+
    };
}

impl ServerConfig {
    setter! {
        addr: IpAddr;
        port: u16;
        backlog: i32;
        /// At least one thread is started.
        acceptors: usize;
        /// At least one multiplexer is started.
        multiplexers: usize;
        workers: usize;
        max_frame_size: usize;
        poll_timeout: Duration;
        handshake_timeout: Option<Duration>;
    }

    #[inline]
    pub fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.addr, self.port) }
}
