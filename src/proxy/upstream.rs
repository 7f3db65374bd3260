//! Upstream fetches for proxied routes
//!
//! Requests are forwarded over plain HTTP as `HTTP/1.0` with
//! `Connection: close`, so the upstream delimits the body by closing the
//! connection and never answers chunked. The body is handed back as a
//! [`Read`] source to be re-framed by the response writer.

use std::io::{self, Cursor, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::{Buf, Bytes, BytesMut};
use url::Url;

use crate::http::headers::{find_crlf, Headers};

/// Default buffer size for reading the response head
const BUFFER_SIZE: usize = 8192;

/// Upper bound on the response head
const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Status line and headers of an upstream response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Headers,
}

/// Body of an upstream response: bytes read along with the head, then the
/// rest of the socket.
pub struct UpstreamBody<S> {
    head: ResponseHead,
    body: io::Chain<Cursor<Bytes>, S>,
}

impl<S: Read> UpstreamBody<S> {
    pub fn head(&self) -> &ResponseHead {
        &self.head
    }
}

impl<S: Read> Read for UpstreamBody<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body.read(buf)
    }
}

/// A plain-HTTP upstream server
#[derive(Debug, Clone)]
pub struct Upstream {
    base: Url,
    timeout: Duration,
}

impl Upstream {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).context("Invalid upstream URL")?;
        if base.scheme() != "http" {
            anyhow::bail!("Unsupported upstream scheme: {}", base.scheme());
        }
        base.host_str().context("Upstream URL missing host")?;
        Ok(Self { base, timeout })
    }

    /// Appends `path` (with an optional query) to the upstream base URL.
    ///
    /// The result always points at the base host; leading slashes in `path`
    /// are collapsed so `//host/...` stays a path.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };

        let mut url = self.base.clone();
        url.set_path(&format!(
            "{}/{}",
            self.base.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        ));
        url.set_query(query);
        url.set_fragment(None);

        if url.host_str() != self.base.host_str() || url.port() != self.base.port() {
            anyhow::bail!("Upstream path {path} escapes {}", self.base);
        }
        Ok(url)
    }

    /// Build HTTP request bytes to send upstream
    pub fn build_http_request(&self, url: &Url) -> Result<Vec<u8>> {
        let host = url.host_str().context("Upstream URL missing host")?;
        let host_value = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let mut target = url.path().to_string();
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }

        Ok(format!(
            "GET {target} HTTP/1.0\r\nHost: {host_value}\r\nConnection: close\r\n\r\n"
        )
        .into_bytes())
    }

    /// Connects upstream, sends a `GET` for `path` and returns the body
    /// once a successful response head has been read.
    pub fn fetch(&self, path: &str) -> Result<UpstreamBody<TcpStream>> {
        let url = self.resolve(path)?;
        let host = url.host_str().context("Upstream URL missing host")?;
        let port = url.port_or_known_default().unwrap_or(80);

        let addr = (host, port)
            .to_socket_addrs()
            .with_context(|| format!("Failed to resolve {host}:{port}"))?
            .next()
            .with_context(|| format!("No address for {host}:{port}"))?;

        let mut stream = TcpStream::connect_timeout(&addr, self.timeout)
            .with_context(|| format!("Failed to connect to upstream {addr}"))?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        tracing::debug!(upstream = %url, "Connected to upstream");

        let request = self.build_http_request(&url)?;
        stream.write_all(&request)?;
        stream.flush()?;

        let body = read_response(stream)?;
        tracing::info!(
            upstream = %url,
            status = body.head.status,
            "Upstream responded"
        );
        if !(200..300).contains(&body.head.status) {
            anyhow::bail!("Upstream returned status {}", body.head.status);
        }
        Ok(body)
    }
}

/// Reads the status line and headers from `stream`, returning them along
/// with a reader over the remaining body.
pub fn read_response<S: Read>(mut stream: S) -> Result<UpstreamBody<S>> {
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

    let status_end = loop {
        if let Some(end) = find_crlf(&buffer) {
            break end;
        }
        fill(&mut stream, &mut buffer)?;
    };
    let status = parse_status_line(&buffer[..status_end])?;
    buffer.advance(status_end + 2);

    let mut headers = Headers::new();
    loop {
        let (consumed, finished) = headers
            .parse(&buffer)
            .context("Invalid upstream response header")?;
        buffer.advance(consumed);
        if finished {
            break;
        }
        if consumed == 0 {
            fill(&mut stream, &mut buffer)?;
        }
    }

    Ok(UpstreamBody {
        head: ResponseHead { status, headers },
        body: Read::chain(Cursor::new(buffer.freeze()), stream),
    })
}

fn fill<S: Read>(stream: &mut S, buffer: &mut BytesMut) -> Result<()> {
    if buffer.len() > MAX_HEAD_SIZE {
        anyhow::bail!("Upstream response head too large");
    }

    let mut block = [0u8; BUFFER_SIZE];
    let n = stream.read(&mut block)?;
    if n == 0 {
        anyhow::bail!("Connection closed before complete response head received");
    }
    buffer.extend_from_slice(&block[..n]);
    Ok(())
}

fn parse_status_line(line: &[u8]) -> Result<u16> {
    let line = std::str::from_utf8(line).context("Invalid UTF-8 in status line")?;
    let mut parts = line.splitn(3, ' ');

    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        anyhow::bail!("Invalid status line: {line}");
    }
    parts
        .next()
        .context("Status line missing code")?
        .parse::<u16>()
        .with_context(|| format!("Invalid status code in {line:?}"))
}
