//! Structured, bounded audit trail.
//!
//! Handlers snapshot a [`RequestContext`] when they start and report one
//! outcome when they finish. The logger derives a [`Severity`] from the status
//! code and error, keeps the newest entries in memory, and forwards each entry
//! to its [`AuditSink`]s.
//!
//! # Tracing Events
//!
//! - `gatehouse.audit` - One event per entry from [`TracingSink`]
//! - `gatehouse.audit.sink_failed` - A sink returned an error or panicked

mod config;
mod entry;
mod logger;
mod query;
mod severity;
mod sink;
mod store;

pub use config::{AuditConfig, AuditConfigBuilder};
pub use entry::{AuditLogEntry, AuditOutcome, RequestContext};
pub use logger::{AuditLogger, AuditStats, AuditTrail};
pub use query::{
    ADMIN_ROLE, AppliedFilters, AuditQueryData, AuditQueryParams, AuditRoutesState, Identity,
    IdentityResolver, audit_routes,
};
pub use severity::{ParseSeverityError, Severity};
pub use sink::{AuditSink, SinkError, TracingSink};
pub use store::{AuditLogStore, DEFAULT_MAX_LOGS};
