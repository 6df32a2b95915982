mod common;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use hivews::frame::OpCode;

use common::*;

#[test]
fn server_handshake() {
    let echo = Arc::new(Echo::default());
    let server = start(config(), echo.clone());

    for _ in 0..10 {
        let _ws = connect(&server);
    }
    wait_until("open callbacks", || echo.opened() == 10);
}

#[test]
fn server_handshake_missing_key() {
    let echo = Arc::new(Echo::default());
    let server = start(config(), echo.clone());

    let mut tcp = dial(&server);
    tcp.write_all(b"GET /ws HTTP/1.1\r\nHost: a\r\nUpgrade: websocket\r\n\r\n")
        .unwrap();
    expect_eof(&mut tcp);

    let mut tcp = dial(&server);
    tcp.write_all(request("").as_bytes()).unwrap();
    expect_eof(&mut tcp);

    // the acceptor survives rejects
    let _ws = connect(&server);
    wait_until("open callback", || echo.opened() == 1);
    assert!(echo.closed().is_empty());
}

#[test]
fn server_handshake_single_read() {
    let echo = Arc::new(Echo::default());
    let server = start(config(), echo.clone());

    let req = request(&new_key());

    // the rest never gets a chance
    let mut tcp = dial(&server);
    tcp.write_all(&req.as_bytes()[..30]).unwrap();
    expect_eof(&mut tcp);
    assert_eq!(echo.opened(), 0);
}

#[test]
fn server_handshake_silent_client() {
    let echo = Arc::new(Echo::default());
    let server = start(
        config().handshake_timeout(Some(Duration::from_millis(100))),
        echo.clone(),
    );

    let mut silent = dial(&server);
    expect_eof(&mut silent);

    let _ws = connect(&server);
    wait_until("open callback", || echo.opened() == 1);
}

#[test]
fn server_handshake_with_frames() {
    let server = start(config(), Echo::default());

    let key = new_key();
    let mut data = request(&key).into_bytes();
    data.extend(client_frame(true, OpCode::Text, b"first"));
    data.extend(client_frame(true, OpCode::Text, b"second"));

    let mut ws = dial(&server);
    ws.write_all(&data).unwrap();
    read_response(&mut ws, &key);

    assert_eq!(recv(&mut ws), (OpCode::Text, b"first".to_vec()));
    assert_eq!(recv(&mut ws), (OpCode::Text, b"second".to_vec()));

    send(&mut ws, OpCode::Text, b"third");
    assert_eq!(recv(&mut ws), (OpCode::Text, b"third".to_vec()));
}
