use std::io::Write;

use httpframe::http::connection::{Connection, ConnectionState, Handler};
use httpframe::http::error::HttpError;
use httpframe::http::request::Request;
use httpframe::http::response::{default_headers, StatusCode};
use httpframe::http::writer::ResponseWriter;

/// Echoes the target and body back.
struct Echo;

impl Handler for Echo {
    fn handle<W: Write>(
        &self,
        writer: &mut ResponseWriter<W>,
        request: &Request,
    ) -> Result<(), HttpError> {
        let mut body = format!("{} {}\n", request.method(), request.target()).into_bytes();
        body.extend_from_slice(&request.body);
        let mut headers = default_headers(0);
        writer.write_message(StatusCode::Ok.as_u16(), &mut headers, &body)
    }
}

/// Writes the body before the headers.
struct OutOfOrder;

impl Handler for OutOfOrder {
    fn handle<W: Write>(
        &self,
        writer: &mut ResponseWriter<W>,
        _request: &Request,
    ) -> Result<(), HttpError> {
        writer.write_status_line(200)?;
        writer.write_body(b"oops")?;
        Ok(())
    }
}

fn serve<H: Handler>(raw: &[u8], handler: &H) -> (Result<(), HttpError>, String) {
    let mut conn = Connection::new(raw, Vec::new());
    assert_eq!(conn.state(), ConnectionState::Reading);
    let result = conn.serve(handler);
    assert_eq!(conn.state(), ConnectionState::Closed);
    let out = String::from_utf8(conn.into_writer()).unwrap();
    (result, out)
}

#[test]
fn test_valid_request_reaches_handler() {
    let raw = b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
    let (result, out) = serve(raw, &Echo);

    assert!(result.is_ok());
    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(out.contains("content-length: 16\r\n"));
    assert!(out.ends_with("\r\n\r\nPOST /echo\nhello"));
}

#[test]
fn test_malformed_request_gets_bad_request() {
    let raw = b"GET / HTTP/1.0\r\n\r\n";
    let (result, out) = serve(raw, &Echo);

    assert!(result.is_ok());
    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(out.contains("connection: close\r\n"));
    assert!(out.contains("malformed request line"));

    let body = out.split("\r\n\r\n").nth(1).unwrap();
    assert!(out.contains(&format!("content-length: {}\r\n", body.len())));
}

#[test]
fn test_truncated_request_gets_bad_request() {
    let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\n";
    let (_, out) = serve(raw, &Echo);

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(out.contains("missing end of headers"));
}

#[test]
fn test_handler_errors_are_returned() {
    let raw = b"GET / HTTP/1.1\r\n\r\n";
    let (result, out) = serve(raw, &OutOfOrder);

    assert!(matches!(
        result,
        Err(HttpError::ProtocolStateViolation { .. })
    ));
    assert_eq!(out, "HTTP/1.1 200 OK\r\n");
}
