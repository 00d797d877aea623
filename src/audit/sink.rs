//! Output destinations for audit entries.
//!
//! Sinks only render; severity derivation and bounded storage happen in the
//! logger before an entry reaches a sink.

use super::entry::AuditLogEntry;
use super::severity::Severity;

/// Error reported by a sink that could not emit an entry.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode audit entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A destination for audit entries (console, log forwarder, metrics).
pub trait AuditSink: Send + Sync {
    /// Short name used when reporting sink failures.
    fn name(&self) -> &str;

    fn emit(&self, entry: &AuditLogEntry) -> Result<(), SinkError>;
}

/// Console sink writing through `tracing`.
///
/// One line per entry at a level matching its severity; critical entries
/// also get a structured detail event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl AuditSink for TracingSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn emit(&self, entry: &AuditLogEntry) -> Result<(), SinkError> {
        let line = entry.summary_line();
        match entry.severity {
            Severity::Info => tracing::info!(
                target: "gatehouse.audit",
                request_id = %entry.request_id,
                "{}",
                line
            ),
            Severity::Warn => tracing::warn!(
                target: "gatehouse.audit",
                request_id = %entry.request_id,
                "{}",
                line
            ),
            Severity::Error | Severity::Critical => tracing::error!(
                target: "gatehouse.audit",
                request_id = %entry.request_id,
                "{}",
                line
            ),
        }

        if entry.severity == Severity::Critical {
            let metadata = entry
                .metadata
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            tracing::error!(
                target: "gatehouse.audit",
                function = %entry.function,
                action = %entry.action,
                user_id = ?entry.user_id,
                user_email = ?entry.user_email,
                user_role = ?entry.user_role,
                ip = %entry.ip,
                error = ?entry.error,
                metadata = ?metadata,
                "Critical request failure"
            );
        }

        Ok(())
    }
}
