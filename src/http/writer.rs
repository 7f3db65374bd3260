//! Response serialization.
//!
//! A [`ResponseWriter`] emits one response onto a byte stream, either as a
//! fixed body framed by `Content-Length` or as a chunked stream followed by
//! trailers. Parts must be written in order; each write only advances the
//! state once the underlying stream accepted it.

use std::io::{ErrorKind, Read, Write};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::http::error::HttpError;
use crate::http::headers::Headers;
use crate::http::response::reason_phrase;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Default size of each block read from a streaming source.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

pub const TRAILER_SHA256: &str = "X-Content-SHA256";
pub const TRAILER_LENGTH: &str = "X-Content-Length";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    AwaitingStatusLine,
    AwaitingHeaders,
    AwaitingBody,
    /// At least one chunk has been sent; only more chunks or the terminator
    /// may follow.
    WritingChunks,
    /// The terminating zero-length chunk has been sent.
    AwaitingTrailers,
    Done,
}

impl WriterState {
    fn describe(self) -> &'static str {
        match self {
            WriterState::AwaitingStatusLine => "awaiting status line",
            WriterState::AwaitingHeaders => "awaiting headers",
            WriterState::AwaitingBody => "awaiting body",
            WriterState::WritingChunks => "writing chunks",
            WriterState::AwaitingTrailers => "awaiting trailers",
            WriterState::Done => "response complete",
        }
    }
}

pub struct ResponseWriter<W> {
    stream: W,
    state: WriterState,
    chunk_size: usize,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(stream: W) -> Self {
        Self {
            stream,
            state: WriterState::AwaitingStatusLine,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets the block size used by [`write_chunks_from_reader`](Self::write_chunks_from_reader).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn get_ref(&self) -> &W {
        &self.stream
    }

    pub fn into_inner(self) -> W {
        self.stream
    }

    fn expect(&self, allowed: &[WriterState], attempted: &'static str) -> Result<(), HttpError> {
        if !allowed.contains(&self.state) {
            return Err(HttpError::ProtocolStateViolation {
                state: self.state.describe(),
                attempted,
            });
        }
        Ok(())
    }

    /// Writes `HTTP/1.1 <code> <reason>\r\n`.
    pub fn write_status_line(&mut self, code: u16) -> Result<(), HttpError> {
        self.expect(&[WriterState::AwaitingStatusLine], "write status line")?;
        let reason = reason_phrase(code).ok_or(HttpError::UnrecognizedStatusCode(code))?;

        let line = format!("{HTTP_VERSION} {code} {reason}\r\n");
        self.stream.write_all(line.as_bytes())?;
        self.state = WriterState::AwaitingHeaders;
        debug!(status = code, "Wrote status line");
        Ok(())
    }

    /// Writes every header line followed by the blank terminator line.
    pub fn write_headers(&mut self, headers: &Headers) -> Result<(), HttpError> {
        self.expect(&[WriterState::AwaitingHeaders], "write headers")?;
        self.stream.write_all(&serialize_fields(headers.iter()))?;
        self.state = WriterState::AwaitingBody;
        Ok(())
    }

    /// Writes the raw body, completing a fixed-length response.
    ///
    /// Fails once a chunk has been sent.
    pub fn write_body(&mut self, body: &[u8]) -> Result<usize, HttpError> {
        self.expect(&[WriterState::AwaitingBody], "write body")?;
        self.stream.write_all(body)?;
        self.stream.flush()?;
        self.state = WriterState::Done;
        Ok(body.len())
    }

    /// Writes a complete response with a fixed body.
    ///
    /// `Content-Length` is always replaced with the length of `body`.
    pub fn write_message(
        &mut self,
        code: u16,
        headers: &mut Headers,
        body: &[u8],
    ) -> Result<(), HttpError> {
        self.write_status_line(code)?;
        headers.replace("Content-Length", body.len().to_string());
        self.write_headers(headers)?;
        self.write_body(body)?;
        Ok(())
    }

    /// Writes one chunk: `HEXLEN\r\n<bytes>\r\n`.
    ///
    /// An empty slice writes nothing, since a zero-length chunk would end
    /// the body.
    pub fn write_chunked_body(&mut self, data: &[u8]) -> Result<usize, HttpError> {
        self.expect(
            &[WriterState::AwaitingBody, WriterState::WritingChunks],
            "write chunk",
        )?;
        if data.is_empty() {
            return Ok(0);
        }

        let mut chunk = format!("{:X}\r\n", data.len()).into_bytes();
        chunk.extend_from_slice(data);
        chunk.extend_from_slice(b"\r\n");
        self.stream.write_all(&chunk)?;
        self.state = WriterState::WritingChunks;
        Ok(data.len())
    }

    /// Writes the zero-length terminator chunk.
    pub fn write_chunked_body_done(&mut self) -> Result<(), HttpError> {
        self.expect(
            &[WriterState::AwaitingBody, WriterState::WritingChunks],
            "end chunked body",
        )?;
        self.stream.write_all(b"0\r\n")?;
        self.state = WriterState::AwaitingTrailers;
        Ok(())
    }

    /// Writes the trailer section after the terminator chunk.
    ///
    /// Only fields named in the `Trailer` header of `headers` with a
    /// non-empty value are sent, under the names as declared there.
    pub fn write_trailers(&mut self, headers: &Headers) -> Result<(), HttpError> {
        self.expect(&[WriterState::AwaitingTrailers], "write trailers")?;

        let declared = headers.get("Trailer").unwrap_or_default();
        let trailers: Vec<(&str, &str)> = declared
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .filter_map(|name| {
                headers
                    .get(name)
                    .filter(|value| !value.is_empty())
                    .map(|value| (name, value))
            })
            .collect();

        self.stream.write_all(&serialize_fields(trailers))?;
        self.stream.flush()?;
        self.state = WriterState::Done;
        Ok(())
    }

    /// Streams `source` as a chunked response with digest trailers.
    ///
    /// Reading stops at end of input or at the first read error; either way
    /// the body is terminated and the `X-Content-SHA256` and
    /// `X-Content-Length` trailers describe what was actually forwarded.
    /// Returns the number of body bytes sent.
    pub fn write_chunks_from_reader<R: Read>(
        &mut self,
        code: u16,
        mut source: R,
        headers: &mut Headers,
    ) -> Result<u64, HttpError> {
        headers.remove("Content-Length");
        headers.replace("Transfer-Encoding", "chunked");
        headers.replace("Trailer", format!("{TRAILER_SHA256}, {TRAILER_LENGTH}"));

        self.write_status_line(code)?;
        self.write_headers(headers)?;

        let mut hasher = Sha256::new();
        let mut forwarded: u64 = 0;
        let mut block = vec![0u8; self.chunk_size];

        loop {
            let n = match source.read(&mut block) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, forwarded, "Streaming source failed, ending body");
                    break;
                }
            };

            hasher.update(&block[..n]);
            forwarded += n as u64;
            self.write_chunked_body(&block[..n])?;
        }

        self.write_chunked_body_done()?;

        headers.replace(TRAILER_SHA256, to_upper_hex(&hasher.finalize()));
        headers.replace(TRAILER_LENGTH, forwarded.to_string());
        self.write_trailers(headers)?;

        debug!(bytes = forwarded, "Chunked body complete");
        Ok(forwarded)
    }
}

/// Serializes `Name: Value\r\n` lines plus the blank terminator line.
fn serialize_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<u8> {
    let mut buf = Vec::new();
    for (name, value) in fields {
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    buf.extend_from_slice(b"\r\n");
    buf
}

fn to_upper_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}
