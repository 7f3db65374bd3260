use std::io::{Read, Write};

use tracing::{info, warn};

use crate::http::error::HttpError;
use crate::http::parser::request_from_reader;
use crate::http::request::Request;
use crate::http::response::{default_headers, StatusCode};
use crate::http::writer::ResponseWriter;

/// Produces the response for a parsed request.
///
/// The request has passed every parser check before the handler runs, and
/// the writer is in its initial state.
pub trait Handler: Send + Sync {
    fn handle<W: Write>(
        &self,
        writer: &mut ResponseWriter<W>,
        request: &Request,
    ) -> Result<(), HttpError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Reading,
    Processing,
    Closed,
}

/// One request/response exchange over a blocking byte stream.
pub struct Connection<R, W> {
    reader: R,
    writer: ResponseWriter<W>,
    state: ConnectionState,
}

impl<R: Read, W: Write> Connection<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer: ResponseWriter::new(writer),
            state: ConnectionState::Reading,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.writer = self.writer.with_chunk_size(chunk_size);
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Parses one request and answers it.
    ///
    /// A request that fails to parse gets a `400 Bad Request` naming the
    /// error; nothing is retried and the exchange ends either way.
    pub fn serve<H: Handler>(&mut self, handler: &H) -> Result<(), HttpError> {
        let result = match request_from_reader(&mut self.reader) {
            Ok(request) => {
                self.state = ConnectionState::Processing;
                info!(
                    method = %request.method(),
                    target = %request.target(),
                    "Handling request"
                );
                handler.handle(&mut self.writer, &request)
            }
            Err(err) => {
                warn!(error = %err, "Rejecting malformed request");
                let body = format!("That's such a bad request tho...\n  {err}\n");
                let mut headers = default_headers(body.len());
                self.writer
                    .write_message(StatusCode::BadRequest.as_u16(), &mut headers, body.as_bytes())
            }
        };

        self.state = ConnectionState::Closed;
        result
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }
}
