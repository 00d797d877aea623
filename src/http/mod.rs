//! HTTP request metadata and response envelopes.

pub mod request;
pub mod response;

pub use request::{RequestMeta, UNKNOWN};
pub use response::ApiResponse;
