//! Fixed-window admission control.
//!
//! Handlers pick one of the built-in [`AdmissionPolicy`] values and ask the
//! [`AdmissionControl`] whether the request may proceed. Rejections become a
//! 429 response with retry metadata; they are never raised as errors.

mod config;
mod janitor;
mod key;
mod layer;
mod limiter;
mod policy;
mod response;
mod store;

pub use config::{RateLimitConfig, RateLimitConfigBuilder};
pub use janitor::{JanitorHandle, spawn_janitor};
pub use key::{KeyStrategy, TOKEN_PREFIX_LEN};
pub use layer::{AdmissionLayer, AdmissionService};
pub use limiter::{AdmissionControl, RateLimitDecision, RateLimitStats, RateLimiter};
pub use policy::{AdmissionPolicy, InvalidPolicy, PolicyKind, PolicyRegistry};
pub use response::{
    RateLimitExceeded, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET,
    apply_rate_limit_headers, rate_limited_response,
};
pub use store::{RateLimitEntry, RateLimitStore};
