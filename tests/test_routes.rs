use std::path::PathBuf;
use std::time::Duration;

use httpframe::http::connection::{Connection, Handler};
use httpframe::http::request::{Method, RequestBuilder};
use httpframe::http::writer::ResponseWriter;
use httpframe::proxy::upstream::Upstream;
use httpframe::server::App;

fn assets_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("httpframe-{}-{name}", std::process::id()));
    std::fs::create_dir_all(dir.join("video")).unwrap();
    dir
}

fn app(assets: PathBuf) -> App {
    // Nothing listens on port 9; upstream routes fail fast.
    let upstream = Upstream::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
    App::with_parts(assets, upstream)
}

fn get(app: &App, target: &str) -> String {
    let raw = format!("GET {target} HTTP/1.1\r\nHost: localhost:42069\r\n\r\n");
    let mut conn = Connection::new(raw.as_bytes(), Vec::new()).with_chunk_size(16);
    conn.serve(app).unwrap();
    String::from_utf8_lossy(&conn.into_writer()).to_string()
}

#[test]
fn test_fixed_pages() {
    let app = app(assets_dir("pages"));

    let out = get(&app, "/");
    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(out.contains("content-type: text/html\r\n"));
    assert!(out.contains("<h1>Success!</h1>"));

    assert!(get(&app, "/yourproblem").starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(get(&app, "/myproblem").starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
}

#[test]
fn test_video_is_streamed_chunked() {
    let assets = assets_dir("video");
    let contents = vec![7u8; 40];
    std::fs::write(assets.join("video").join("clip.mp4"), &contents).unwrap();
    let app = app(assets);

    let out = get(&app, "/video/clip.mp4");

    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(out.contains("content-type: video/mp4\r\n"));
    assert!(out.contains("transfer-encoding: chunked\r\n"));
    assert!(!out.contains("content-length"));
    assert!(out.contains("\r\n10\r\n"));
    assert!(out.contains("\r\n8\r\n"));
    assert!(out.contains("X-Content-Length: 40\r\n"));
}

#[test]
fn test_missing_or_escaping_video_is_not_found() {
    let app = app(assets_dir("missing"));

    assert!(get(&app, "/video/nope.mp4").starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(get(&app, "/video/../../etc/passwd").starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(get(&app, "/video/").starts_with("HTTP/1.1 404 Not Found\r\n"));
}

#[test]
fn test_unreachable_upstream_is_internal_error() {
    let app = app(assets_dir("upstream"));

    let out = get(&app, "/httpbin/stream/3");

    assert!(out.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(out.contains("<h1>Internal Server Error</h1>"));
}

#[test]
fn test_handler_called_directly() {
    let app = app(assets_dir("direct"));
    let request = RequestBuilder::new()
        .method(Method::POST)
        .target("/myproblem")
        .header("Host", "localhost")
        .body(b"ignored".to_vec())
        .build()
        .unwrap();

    let mut writer = ResponseWriter::new(Vec::new());
    app.handle(&mut writer, &request).unwrap();

    let out = String::from_utf8(writer.into_inner()).unwrap();
    assert!(out.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(out.contains("connection: close\r\n"));
}
