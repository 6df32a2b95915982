#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{Ipv4Addr, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use parking_lot::Mutex;

use hivews::buffer::{Buffer, BufferPool};
use hivews::frame::{close, Frame, Mask, OpCode};
use hivews::handshake::{create_accept_key, find_header_end, parse_headers};
use hivews::server::{Server, ServerConfig};
use hivews::{Connection, Error, Handler};

pub fn init_log() { let _ = env_logger::builder().is_test(true).try_init(); }

pub fn config() -> ServerConfig {
    ServerConfig::default()
        .addr(Ipv4Addr::LOCALHOST.into())
        .port(0)
        .acceptors(1)
        .multiplexers(2)
        .workers(4)
        .poll_timeout(Duration::from_millis(50))
        .handshake_timeout(Some(Duration::from_secs(2)))
}

pub fn start<H: Handler>(config: ServerConfig, handler: H) -> Server {
    init_log();
    let server = Server::bind(config, handler).unwrap();
    server.start().unwrap();
    debug!("test: server on {}", server.local_addr());
    server
}

pub fn request(key: &str) -> String {
    format!(
        "GET /ws HTTP/1.1\r\n\
         Host: www.example.com\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {}\r\n\
         Sec-WebSocket-Version: 13\r\n\r\n",
        key
    )
}

pub fn new_key() -> String { STANDARD.encode(rand::random::<[u8; 16]>()) }

/// Open a tcp connection with sane timeouts.
pub fn dial(server: &Server) -> TcpStream {
    let stream = TcpStream::connect(server.local_addr()).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.set_nodelay(true).unwrap();
    stream
}

/// Read the handshake response and check the accept key.
pub fn read_response(stream: &mut TcpStream, key: &str) {
    let mut resp = Vec::new();
    let mut byte = [0_u8; 1];
    while find_header_end(&resp).is_none() {
        assert_eq!(stream.read(&mut byte).unwrap(), 1, "eof in handshake");
        resp.push(byte[0]);
    }

    assert!(resp.starts_with(b"HTTP/1.1 101 Switching Protocols\r\n"));
    let headers = parse_headers(&resp);
    assert_eq!(headers.get("upgrade").map(String::as_str), Some("websocket"));
    assert_eq!(
        headers.get("sec-websocket-accept").map(String::as_str),
        Some(create_accept_key(key).as_str())
    );
}

/// Connect and upgrade.
pub fn connect(server: &Server) -> TcpStream {
    let mut stream = dial(server);
    let key = new_key();
    stream.write_all(request(&key).as_bytes()).unwrap();
    read_response(&mut stream, &key);
    stream
}

/// Masked client frame.
pub fn client_frame(fin: bool, opcode: OpCode, payload: &[u8]) -> Vec<u8> {
    let pool = BufferPool::new();
    let frame = Frame::new(fin, opcode, Mask::Key(rand::random()), payload);
    frame.encode(&pool).unwrap().read().to_vec()
}

pub fn send(stream: &mut TcpStream, opcode: OpCode, payload: &[u8]) {
    stream.write_all(&client_frame(true, opcode, payload)).unwrap();
}

/// Read one server frame.
pub fn recv(stream: &mut TcpStream) -> (OpCode, Vec<u8>) {
    let mut raw = Vec::new();
    let mut tmp = vec![0_u8; 16 * 1024];
    loop {
        let mut buf = Buffer::from_slice(&raw);
        let decoded = Frame::decode(&mut buf)
            .map(|frame| (frame.is_masked(), frame.opcode, frame.payload.to_vec()));
        if let Some((masked, opcode, payload)) = decoded {
            assert!(!masked, "server frames are never masked");
            assert!(buf.is_empty(), "read past one frame");
            return (opcode, payload);
        }

        // never consume more than the rest of the current frame
        let want = match hivews::frame::peek_frame_len(&raw) {
            Some((_, total)) => total as usize - raw.len(),
            None => 1,
        };
        let cap = want.min(tmp.len());
        let n = stream.read(&mut tmp[..cap]).unwrap();
        assert_ne!(n, 0, "unexpected eof");
        raw.extend_from_slice(&tmp[..n]);
    }
}

/// Expect a close frame, return its code and reason.
pub fn recv_close(stream: &mut TcpStream) -> (u16, String) {
    let (opcode, payload) = recv(stream);
    assert_eq!(opcode, OpCode::Close);
    close::decode_payload(&payload).unwrap()
}

/// Expect the server to have shut the socket down.
pub fn expect_eof(stream: &mut TcpStream) {
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty(), "unexpected data: {:?}", rest);
}

pub fn wait_until(what: &str, f: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !f() {
        assert!(Instant::now() < deadline, "timeout waiting for {}", what);
        thread::sleep(Duration::from_millis(5));
    }
}

/// Echo server which counts callbacks.
#[derive(Default)]
pub struct Echo {
    pub opened: AtomicUsize,
    pub closed: Mutex<Vec<(u64, u16, String)>>,
    pub errors: AtomicUsize,
}

impl Echo {
    pub fn opened(&self) -> usize { self.opened.load(Ordering::SeqCst) }

    pub fn closed(&self) -> Vec<(u64, u16, String)> { self.closed.lock().clone() }
}

impl Handler for Echo {
    fn on_open(&self, _conn: &Connection) { self.opened.fetch_add(1, Ordering::SeqCst); }

    fn on_text(&self, conn: &Connection, text: &str) { conn.send_text(text).unwrap(); }

    fn on_binary(&self, conn: &Connection, data: &[u8]) { conn.send_binary(data).unwrap(); }

    fn on_close(&self, conn: &Connection, code: u16, reason: &str) {
        self.closed.lock().push((conn.id(), code, reason.to_string()));
    }

    fn on_error(&self, conn: &Connection, err: &Error) {
        debug!("test: conn[{}] error: {}", conn.id(), err);
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}
