use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use httpframe::proxy::upstream::Upstream;
use httpframe::server::{listener, App};
use tokio::net::TcpListener;

fn exchange(addr: std::net::SocketAddr, request: &'static [u8]) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(request).unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    String::from_utf8_lossy(&response).to_string()
}

#[tokio::test]
async fn test_serves_each_connection_once() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let upstream = Upstream::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
    let app = Arc::new(App::with_parts(std::env::temp_dir(), upstream));

    let server = tokio::spawn(listener::serve(listener, app, 1024));

    let ok = tokio::task::spawn_blocking(move || {
        exchange(addr, b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
    })
    .await
    .unwrap();
    assert!(ok.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(ok.contains("connection: close\r\n"));

    let bad = tokio::task::spawn_blocking(move || exchange(addr, b"BREW /pot HTTP/1.1\r\n\r\n"))
        .await
        .unwrap();
    assert!(bad.starts_with("HTTP/1.1 400 Bad Request\r\n"));

    server.abort();
}
