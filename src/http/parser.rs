//! Incremental request parsing.
//!
//! [`RequestParser`] is a push parser: it is handed whatever bytes are
//! buffered and reports how many it consumed. [`request_from_reader`] drives
//! it from a blocking reader, refilling and draining a single buffer.

use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use tracing::{debug, trace, warn};

use crate::http::error::HttpError;
use crate::http::headers::{find_crlf, Headers, CRLF};
use crate::http::request::{declared_length, Request, RequestLine};

const BUFFER_SIZE: usize = 4096;
const READ_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Initialized,
    ParsingRequestLine,
    ParsingHeaders,
    ParsingBody,
    Done,
}

impl ParserState {
    fn incomplete_reason(self) -> &'static str {
        match self {
            ParserState::Initialized | ParserState::ParsingRequestLine => "missing request line",
            ParserState::ParsingHeaders => "missing end of headers",
            ParserState::ParsingBody => "body shorter than declared content length",
            ParserState::Done => "message already complete",
        }
    }
}

/// State machine that assembles one [`Request`].
#[derive(Debug)]
pub struct RequestParser {
    state: ParserState,
    request_line: Option<RequestLine>,
    headers: Headers,
    body: Vec<u8>,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Initialized,
            request_line: None,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes as many complete units from `data` as possible.
    ///
    /// Returns the number of bytes consumed; the caller must drop them from
    /// its buffer before calling again. Fails if the parser is already done.
    pub fn parse(&mut self, data: &[u8]) -> Result<usize, HttpError> {
        if self.is_done() {
            return Err(HttpError::ProtocolStateViolation {
                state: "parser already complete",
                attempted: "parse more data",
            });
        }

        let mut total = 0;
        while !self.is_done() {
            let n = self.parse_single(&data[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    fn parse_single(&mut self, data: &[u8]) -> Result<usize, HttpError> {
        match self.state {
            ParserState::Initialized | ParserState::ParsingRequestLine => {
                self.state = ParserState::ParsingRequestLine;
                let Some(line_end) = find_crlf(data) else {
                    return Ok(0);
                };
                let line = std::str::from_utf8(&data[..line_end]).map_err(|_| {
                    HttpError::MalformedRequestLine("request line is not valid UTF-8".into())
                })?;
                let request_line = RequestLine::parse(line)?;
                debug!(
                    method = %request_line.method,
                    target = %request_line.target,
                    "Parsed request line"
                );
                self.request_line = Some(request_line);
                self.state = ParserState::ParsingHeaders;
                Ok(line_end + CRLF.len())
            }

            ParserState::ParsingHeaders => {
                let mut total = 0;
                loop {
                    let (n, finished) = self.headers.parse(&data[total..])?;
                    total += n;
                    if finished {
                        trace!(fields = self.headers.len(), "Parsed headers");
                        self.state = ParserState::ParsingBody;
                        break;
                    }
                    if n == 0 {
                        break;
                    }
                }
                Ok(total)
            }

            ParserState::ParsingBody => {
                let Some(declared) = declared_length(&self.headers) else {
                    if !data.is_empty() {
                        warn!(
                            bytes = data.len(),
                            "Body bytes present without a Content-Length, ignoring"
                        );
                    }
                    self.state = ParserState::Done;
                    return Ok(0);
                };

                if data.is_empty() {
                    return Ok(0);
                }

                let received = self.body.len() + data.len();
                if received > declared {
                    self.state = ParserState::Done;
                    return Err(HttpError::BodyLengthMismatch { declared, received });
                }

                self.body.extend_from_slice(data);
                if received == declared {
                    debug!(length = declared, "Body complete");
                    self.state = ParserState::Done;
                }
                Ok(data.len())
            }

            ParserState::Done => Err(HttpError::ProtocolStateViolation {
                state: "parser already complete",
                attempted: "parse more data",
            }),
        }
    }

    /// Hands out the assembled request once parsing is done.
    pub fn finish(self) -> Result<Request, HttpError> {
        match (self.state, self.request_line) {
            (ParserState::Done, Some(request_line)) => Ok(Request {
                request_line,
                headers: self.headers,
                body: self.body,
            }),
            (state, _) => Err(HttpError::IncompleteMessage(state.incomplete_reason())),
        }
    }
}

/// Reads and parses one request from `reader`.
///
/// Bytes are appended to a growable buffer and drained through the parser
/// after every read, so message boundaries need not line up with reads.
pub fn request_from_reader<R: Read>(mut reader: R) -> Result<Request, HttpError> {
    let mut parser = RequestParser::new();
    let mut buf = BytesMut::with_capacity(BUFFER_SIZE);

    while !parser.is_done() {
        // Unconsumed tail stays at the front; `resize` reclaims or grows.
        let filled = buf.len();
        buf.resize(filled + READ_SIZE, 0);

        let n = match reader.read(&mut buf[filled..]) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {
                buf.truncate(filled);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        buf.truncate(filled + n);

        if n == 0 {
            trace!(buffered = buf.len(), "End of stream, draining buffer");
            let consumed = parser.parse(&buf)?;
            buf.advance(consumed);
            if !parser.is_done() {
                return Err(HttpError::IncompleteMessage(parser.state().incomplete_reason()));
            }
            break;
        }

        let consumed = parser.parse(&buf)?;
        buf.advance(consumed);
    }

    parser.finish()
}
