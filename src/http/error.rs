use thiserror::Error;

/// Errors produced while framing an HTTP/1.1 exchange.
///
/// Every parse error is fatal to the request it was raised for; writer
/// errors abort the response in progress.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// Wrong field count, unknown method or unsupported version.
    #[error("malformed request line: {0}")]
    MalformedRequestLine(String),

    /// Missing `: ` delimiter or an invalid field name.
    #[error("malformed header line: {0}")]
    MalformedHeaderLine(String),

    /// End of stream arrived before the message was complete.
    #[error("incomplete message: {0}")]
    IncompleteMessage(&'static str),

    #[error("body larger than declared content length ({received} > {declared})")]
    BodyLengthMismatch { declared: usize, received: usize },

    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// A message part was driven in the wrong state.
    #[error("protocol state violation: cannot {attempted} while {state}")]
    ProtocolStateViolation {
        state: &'static str,
        attempted: &'static str,
    },

    #[error("unrecognized status code {0}")]
    UnrecognizedStatusCode(u16),
}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        // Keep the message, drop the transport-specific error type.
        HttpError::TransportFailure(err.to_string())
    }
}
