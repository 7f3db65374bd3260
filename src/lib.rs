//! httpframe - HTTP/1.1 message framing
//!
//! Incremental request parsing and ordered response writing over blocking
//! byte streams, plus a small demo server built on top.

pub mod config;
pub mod http;
pub mod proxy;
pub mod server;
