//! Gatehouse - request governance for HTTP handlers
//!
//! Gatehouse sits in front of handler logic and decides whether a request may
//! proceed, then records what happened once it has been handled.
//!
//! # Features
//!
//! - **Admission control**: Fixed-window counters keyed by client identity,
//!   with four built-in policies (general, invite, admin, ban)
//! - **Rejections**: Standard 429 body with `Retry-After` and `X-RateLimit-*`
//!   headers plus negotiated CORS headers
//! - **Audit trail**: Bounded in-memory history with severity classification,
//!   statistics and pluggable sinks
//! - **Audit endpoint**: Admin-only `GET /audit-logs` router
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gatehouse::{AuditTrail, Governance, PolicyKind, RequestMeta};
//! use axum::{extract::Request, response::{IntoResponse, Response}};
//! use std::sync::Arc;
//!
//! async fn send_invite(governance: Arc<Governance>, req: Request) -> Response {
//!     let meta = RequestMeta::from_request(&req);
//!     if let Err(rejection) = governance.admit_with(&meta, PolicyKind::Invite) {
//!         return rejection;
//!     }
//!
//!     let audit = governance.audit();
//!     let ctx = audit.create_request_context(&meta, "invitations", "send", None, None, None);
//!     // ... do the work
//!     audit.log_success(&ctx, 200, None);
//!     "sent".into_response()
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     gatehouse::init_tracing();
//!
//!     let config = gatehouse::Config::from_env().unwrap_or_default();
//!     let governance = Arc::new(Governance::from_config(&config));
//!     // ... hand `governance` to your handlers
//!     governance.shutdown().await;
//! }
//! ```

pub mod audit;
pub mod clock;
mod config;
pub mod cors;
mod error;
mod governance;
pub mod http;
pub mod ratelimit;
pub mod utils;

pub use audit::{
    AuditConfig, AuditLogEntry, AuditLogger, AuditOutcome, AuditSink, AuditStats, AuditTrail,
    RequestContext, Severity,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigBuilder, LoggingConfig};
pub use cors::{CorsConfig, CorsConfigBuilder};
pub use error::{ErrorResponse, GovernanceError, Result};
pub use governance::{Governance, GovernanceBuilder};
pub use http::{ApiResponse, RequestMeta};
pub use ratelimit::{
    AdmissionControl, AdmissionLayer, AdmissionPolicy, InvalidPolicy, KeyStrategy, PolicyKind,
    RateLimitConfig, RateLimitConfigBuilder, RateLimitDecision, RateLimiter,
};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// Call once, early in `main()`.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "gatehouse=debug")
/// - `GATEHOUSE_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::get_env_parsed::<bool>("LOG_JSON").unwrap_or(false);

    install_subscriber(env_filter, json_logs);
}

/// Initialize tracing from a loaded [`Config`]
pub fn init_tracing_with_config(config: &Config) {
    install_subscriber(EnvFilter::new(&config.logging.level), config.logging.json);
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    // try_init: a subscriber installed by the host application wins.
    if json {
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init();
    }
}
