//! HTTP/1.1 message framing.
//!
//! This module parses one request from a blocking byte stream and writes
//! one response back, with no keep-alive.
//!
//! # Architecture
//!
//! - **`headers`**: case-insensitive header collection and header-line parsing
//! - **`request`**: request line, methods and the parsed request
//! - **`parser`**: incremental request parser driven from a reader
//! - **`response`**: status codes and their reason phrases
//! - **`writer`**: ordered response serialization, fixed or chunked
//! - **`connection`**: glue running one exchange through a [`connection::Handler`]
//! - **`error`**: the error type shared by all of the above
//!
//! # Parser State Machine
//!
//! ```text
//!        ┌───────────────────┐
//!        │ ParsingRequestLine│ ← Wait for the first CRLF
//!        └─────────┬─────────┘
//!                  │ METHOD SP TARGET SP HTTP/1.1
//!                  ▼
//!        ┌───────────────────┐
//!        │  ParsingHeaders   │ ← One field line at a time
//!        └─────────┬─────────┘
//!                  │ blank line
//!                  ▼
//!        ┌───────────────────┐
//!        │   ParsingBody     │ ← Up to Content-Length bytes
//!        └─────────┬─────────┘
//!                  ▼
//!                Done
//! ```
//!
//! # Example
//!
//! ```
//! use httpframe::http::parser::request_from_reader;
//! use httpframe::http::writer::ResponseWriter;
//! use httpframe::http::response::{default_headers, StatusCode};
//!
//! let raw = b"GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n";
//! let request = request_from_reader(&raw[..]).unwrap();
//! assert_eq!(request.target(), "/hello");
//!
//! let mut writer = ResponseWriter::new(Vec::new());
//! let mut headers = default_headers(0);
//! writer.write_message(StatusCode::Ok.as_u16(), &mut headers, b"hi").unwrap();
//! assert!(writer.into_inner().starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

pub mod connection;
pub mod error;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

pub use error::HttpError;
pub use headers::Headers;
