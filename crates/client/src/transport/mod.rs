//! Transport layer for the ADT client.

pub mod http;

pub use http::{AdtRequest, HttpTransport};
