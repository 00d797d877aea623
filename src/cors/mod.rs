//! Cross-Origin Resource Sharing (CORS) header negotiation.
//!
//! Handlers and the admission layer use the same computation so success and
//! rejection responses carry identical CORS headers.

mod config;
mod headers;

pub use config::{CorsConfig, CorsConfigBuilder};
pub use headers::{cors_headers, preflight_response};
