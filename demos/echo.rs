//! Echo server.
//!
//! ```text
//! RUST_LOG=debug cargo run --example echo -- 127.0.0.1 8081
//! ```

use std::env;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use log::info;

use hivews::frame::close;
use hivews::{Connection, Error, Handler, Server, ServerConfig};

#[derive(Default)]
struct Echo {
    online: AtomicUsize,
}

impl Handler for Echo {
    fn on_open(&self, conn: &Connection) {
        let n = self.online.fetch_add(1, Ordering::Relaxed) + 1;
        info!("conn[{}] open from {:?}, {} online", conn.id(), conn.remote_addr(), n);
    }

    fn on_text(&self, conn: &Connection, text: &str) {
        if text == "bye" {
            conn.close(close::NORMAL, "bye");
            return;
        }
        let _ = conn.send_text(text);
    }

    fn on_binary(&self, conn: &Connection, data: &[u8]) { let _ = conn.send_binary(data); }

    fn on_close(&self, conn: &Connection, code: u16, reason: &str) {
        let n = self.online.fetch_sub(1, Ordering::Relaxed) - 1;
        info!("conn[{}] closed: {} {}, {} online", conn.id(), code, reason, n);
    }

    fn on_error(&self, conn: &Connection, err: &Error) { info!("conn[{}] error: {}", conn.id(), err); }
}

fn main() -> std::io::Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let mut config = ServerConfig::default();
    if let Some(addr) = args.next() {
        let addr: IpAddr = addr
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        config = config.addr(addr);
    }
    if let Some(port) = args.next() {
        let port: u16 = port
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        config = config.port(port);
    }

    let server = Server::bind(config, Echo::default())?;
    server.start()?;
    info!("echo server on {}", server.local_addr());

    while server.is_running() {
        thread::sleep(Duration::from_secs(1));
    }
    Ok(())
}
