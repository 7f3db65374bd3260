//! Upstream proxying
//!
//! Fetches a resource from a plain-HTTP upstream and exposes its body as a
//! streaming source for chunked responses.

pub mod upstream;

pub use upstream::{ResponseHead, Upstream, UpstreamBody};
