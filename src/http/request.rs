use std::fmt;

use crate::http::error::HttpError;
use crate::http::headers::Headers;

/// HTTP request methods accepted by the parser.
///
/// The set is fixed; anything else, including lower-case spellings of these
/// methods, is rejected while parsing the request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    CONNECT,
    OPTIONS,
    TRACE,
    PATCH,
}

impl Method {
    /// Parses an HTTP method from its exact upper-case token.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpframe::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "CONNECT" => Some(Method::CONNECT),
            "OPTIONS" => Some(Method::OPTIONS),
            "TRACE" => Some(Method::TRACE),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::CONNECT => "CONNECT",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::PATCH => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first line of a request: `METHOD SP TARGET SP HTTP/1.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    /// Request target, kept verbatim.
    pub target: String,
    /// Protocol version without the `HTTP/` prefix; always `1.1`.
    pub version: String,
}

impl RequestLine {
    /// Parses a request line (without its terminator).
    pub fn parse(line: &str) -> Result<Self, HttpError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let &[method, target, version] = fields.as_slice() else {
            return Err(HttpError::MalformedRequestLine(format!(
                "request line doesn't have 3 fields: {line:?}"
            )));
        };

        if method != method.to_ascii_uppercase() {
            return Err(HttpError::MalformedRequestLine(format!(
                "invalid request method {method:?}"
            )));
        }
        let method = Method::from_str(method).ok_or_else(|| {
            HttpError::MalformedRequestLine(format!("invalid request method {method:?}"))
        })?;

        let version = parse_version(version)?;

        Ok(Self {
            method,
            target: target.to_string(),
            version,
        })
    }
}

fn parse_version(raw: &str) -> Result<String, HttpError> {
    let invalid = || HttpError::MalformedRequestLine(format!("invalid HTTP version {raw:?}"));

    let (protocol, version) = raw.split_once('/').ok_or_else(invalid)?;
    if protocol != "HTTP" {
        return Err(invalid());
    }
    let (major, minor) = version.split_once('.').ok_or_else(invalid)?;
    if major != "1" || minor != "1" {
        return Err(invalid());
    }
    Ok(version.to_string())
}

/// A fully parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: Headers,
    /// Exactly `Content-Length` bytes, or empty when no length was declared.
    pub body: Vec<u8>,
}

impl Request {
    pub fn method(&self) -> Method {
        self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.target
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The declared body length, if the header holds a positive integer.
    pub fn content_length(&self) -> Option<usize> {
        declared_length(&self.headers)
    }
}

pub(crate) fn declared_length(headers: &Headers) -> Option<usize> {
    headers
        .get("Content-Length")
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// Builder for constructing Request objects outside the parser.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    target: Option<String>,
    headers: Headers,
    body: Vec<u8>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            request_line: RequestLine {
                method: self.method.ok_or("method missing")?,
                target: self.target.ok_or("target missing")?,
                version: "1.1".to_string(),
            },
            headers: self.headers,
            body: self.body,
        })
    }
}
