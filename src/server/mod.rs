//! Demo server: accept loop and route table.

pub mod listener;
pub mod routes;

pub use routes::App;
