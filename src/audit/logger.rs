//! Audit logger: builds, stores and emits one entry per handled request.
//!
//! Logging is best-effort. Nothing in here returns an error to the handler:
//! a failing or panicking sink is reported on `gatehouse.audit.sink_failed`
//! and the request outcome is unaffected.

use super::config::AuditConfig;
use super::entry::{AuditLogEntry, AuditOutcome, RequestContext};
use super::severity::Severity;
use super::sink::{AuditSink, TracingSink};
use super::store::AuditLogStore;
use crate::http::RequestMeta;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Aggregates over the retained entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total_logs: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_function: BTreeMap<String, usize>,
    /// Mean response time in milliseconds; 0 when empty.
    pub average_response_time: f64,
    /// Percentage (0-100) of entries classified `error` or `critical`.
    pub error_rate: f64,
}

/// The audit trail as seen by handlers.
///
/// [`AuditLogger`] keeps entries in process memory; an external log store can
/// implement this trait without changing call sites.
pub trait AuditTrail: Send + Sync {
    /// Snapshot identity and start time for a request.
    fn create_request_context(
        &self,
        req: &RequestMeta,
        function: &str,
        action: &str,
        user_id: Option<&str>,
        user_email: Option<&str>,
        user_role: Option<&str>,
    ) -> RequestContext {
        RequestContext::new(req, function, action).with_user(
            user_id.map(str::to_string),
            user_email.map(str::to_string),
            user_role.map(str::to_string),
        )
    }

    /// Record the outcome of `ctx`. Returns the stored entry, or `None` if
    /// logging failed.
    fn record(
        &self,
        ctx: &RequestContext,
        status_code: u16,
        outcome: AuditOutcome,
        metadata: Option<serde_json::Value>,
    ) -> Option<AuditLogEntry>;

    fn log_success(
        &self,
        ctx: &RequestContext,
        status_code: u16,
        metadata: Option<serde_json::Value>,
    ) -> Option<AuditLogEntry> {
        self.record(ctx, status_code, AuditOutcome::Success, metadata)
    }

    fn log_warning(
        &self,
        ctx: &RequestContext,
        status_code: u16,
        message: &str,
        metadata: Option<serde_json::Value>,
    ) -> Option<AuditLogEntry> {
        self.record(ctx, status_code, AuditOutcome::Warning(message.to_string()), metadata)
    }

    fn log_error(
        &self,
        ctx: &RequestContext,
        status_code: u16,
        error: &str,
        metadata: Option<serde_json::Value>,
    ) -> Option<AuditLogEntry> {
        self.record(ctx, status_code, AuditOutcome::Error(error.to_string()), metadata)
    }

    /// Most recent `limit` entries in arrival order.
    fn recent_logs(&self, limit: usize) -> Vec<AuditLogEntry>;

    fn logs_by_severity(&self, severity: Severity) -> Vec<AuditLogEntry>;

    fn logs_by_function(&self, function: &str) -> Vec<AuditLogEntry>;

    fn stats(&self) -> AuditStats;

    /// Empty the store. Administrative reset only.
    fn clear_logs(&self);
}

/// In-memory audit logger.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<Mutex<AuditLogStore>>,
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

impl AuditLogger {
    /// Logger with the console sink enabled per `config.console`.
    pub fn new(config: AuditConfig) -> Self {
        let mut logger = Self::without_sinks(config.max_logs);
        if config.console {
            logger = logger.with_sink(Arc::new(TracingSink::new()));
        }
        logger
    }

    pub fn without_sinks(max_logs: usize) -> Self {
        Self {
            store: Arc::new(Mutex::new(AuditLogStore::new(max_logs))),
            sinks: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn max_logs(&self) -> usize {
        self.store.lock().max_logs()
    }

    /// Entries matching `action`, in arrival order.
    pub fn logs_by_action(&self, action: &str) -> Vec<AuditLogEntry> {
        self.filtered(|entry| entry.action == action)
    }

    fn filtered(&self, keep: impl Fn(&AuditLogEntry) -> bool) -> Vec<AuditLogEntry> {
        self.store
            .lock()
            .iter()
            .filter(|entry| keep(entry))
            .cloned()
            .collect()
    }

    fn emit(&self, entry: &AuditLogEntry) {
        for sink in &self.sinks {
            match catch_unwind(AssertUnwindSafe(|| sink.emit(entry))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(
                    target: "gatehouse.audit.sink_failed",
                    sink = sink.name(),
                    error = %e,
                    entry_id = %entry.id,
                    "Failed to emit audit entry"
                ),
                Err(_) => tracing::warn!(
                    target: "gatehouse.audit.sink_failed",
                    sink = sink.name(),
                    entry_id = %entry.id,
                    "Audit sink panicked"
                ),
            }
        }
    }
}

impl AuditTrail for AuditLogger {
    fn record(
        &self,
        ctx: &RequestContext,
        status_code: u16,
        outcome: AuditOutcome,
        metadata: Option<serde_json::Value>,
    ) -> Option<AuditLogEntry> {
        let built = catch_unwind(AssertUnwindSafe(|| {
            let entry = AuditLogEntry::build(ctx, status_code, &outcome, metadata);
            self.store.lock().push(entry.clone());
            entry
        }));

        match built {
            Ok(entry) => {
                self.emit(&entry);
                Some(entry)
            }
            Err(_) => {
                tracing::warn!(
                    target: "gatehouse.audit.sink_failed",
                    request_id = %ctx.request_id,
                    function = %ctx.function,
                    "Failed to build audit entry"
                );
                None
            }
        }
    }

    fn recent_logs(&self, limit: usize) -> Vec<AuditLogEntry> {
        self.store.lock().recent(limit)
    }

    fn logs_by_severity(&self, severity: Severity) -> Vec<AuditLogEntry> {
        self.filtered(|entry| entry.severity == severity)
    }

    fn logs_by_function(&self, function: &str) -> Vec<AuditLogEntry> {
        self.filtered(|entry| entry.function == function)
    }

    fn stats(&self) -> AuditStats {
        let store = self.store.lock();
        let total_logs = store.len();

        let mut by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.into_iter().map(|s| (s, 0)).collect();
        let mut by_function: BTreeMap<String, usize> = BTreeMap::new();
        let mut total_response_time: u128 = 0;
        let mut failures = 0usize;

        for entry in store.iter() {
            *by_severity.entry(entry.severity).or_default() += 1;
            *by_function.entry(entry.function.clone()).or_default() += 1;
            total_response_time += u128::from(entry.response_time);
            if entry.severity.is_failure() {
                failures += 1;
            }
        }

        let (average_response_time, error_rate) = if total_logs == 0 {
            (0.0, 0.0)
        } else {
            (
                total_response_time as f64 / total_logs as f64,
                failures as f64 / total_logs as f64 * 100.0,
            )
        };

        AuditStats {
            total_logs,
            by_severity,
            by_function,
            average_response_time,
            error_rate,
        }
    }

    fn clear_logs(&self) {
        self.store.lock().clear();
        tracing::info!(target: "gatehouse.audit", "Audit log cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::SinkError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink(AtomicUsize);

    impl AuditSink for CountingSink {
        fn name(&self) -> &str {
            "counting"
        }

        fn emit(&self, _entry: &AuditLogEntry) -> Result<(), SinkError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSink;

    impl AuditSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        fn emit(&self, _entry: &AuditLogEntry) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("collector offline".to_string()))
        }
    }

    struct PanickingSink;

    impl AuditSink for PanickingSink {
        fn name(&self) -> &str {
            "panicking"
        }

        fn emit(&self, _entry: &AuditLogEntry) -> Result<(), SinkError> {
            panic!("sink exploded")
        }
    }

    fn ctx(logger: &AuditLogger, function: &str, action: &str) -> RequestContext {
        logger.create_request_context(
            &RequestMeta::default(),
            function,
            action,
            Some("u-1"),
            None,
            Some("ADMIN"),
        )
    }

    #[test]
    fn test_log_success_defaults() {
        let logger = AuditLogger::without_sinks(10);
        let entry = logger.log_success(&ctx(&logger, "contacts", "list"), 200, None).unwrap();

        assert_eq!(entry.severity, Severity::Info);
        assert_eq!(entry.user_id.as_deref(), Some("u-1"));
        assert!(entry.error.is_none());
        assert_eq!(logger.recent_logs(10).len(), 1);
    }

    #[test]
    fn test_warning_escalates_success_status() {
        let logger = AuditLogger::without_sinks(10);
        let entry = logger
            .log_warning(&ctx(&logger, "goals", "project"), 200, "partial data", None)
            .unwrap();

        assert_eq!(entry.severity, Severity::Warn);
        assert_eq!(entry.error.as_deref(), Some("partial data"));
    }

    #[test]
    fn test_queries() {
        let logger = AuditLogger::without_sinks(10);
        logger.log_success(&ctx(&logger, "contacts", "list"), 200, None);
        logger.log_error(&ctx(&logger, "contacts", "create"), 500, "db down", None);
        logger.log_success(&ctx(&logger, "leaders", "list"), 200, None);

        assert_eq!(logger.logs_by_function("contacts").len(), 2);
        assert_eq!(logger.logs_by_severity(Severity::Critical).len(), 1);
        assert_eq!(logger.logs_by_action("list").len(), 2);

        let recent = logger.recent_logs(2);
        assert_eq!(recent[0].action, "create");
        assert_eq!(recent[1].function, "leaders");
    }

    #[test]
    fn test_stats() {
        let logger = AuditLogger::without_sinks(10);
        logger.log_success(&ctx(&logger, "contacts", "list"), 200, None);
        logger.log_success(&ctx(&logger, "contacts", "list"), 200, None);
        logger.log_error(&ctx(&logger, "contacts", "create"), 400, "bad input", None);
        logger.log_error(&ctx(&logger, "ban", "create"), 503, "upstream", None);

        let stats = logger.stats();
        assert_eq!(stats.total_logs, 4);
        assert_eq!(stats.by_severity[&Severity::Info], 2);
        assert_eq!(stats.by_severity[&Severity::Error], 1);
        assert_eq!(stats.by_severity[&Severity::Critical], 1);
        assert_eq!(stats.by_severity[&Severity::Warn], 0);
        assert_eq!(stats.by_function["contacts"], 3);
        assert_eq!(stats.by_function["ban"], 1);
        assert!((stats.error_rate - 50.0).abs() < f64::EPSILON);
        assert!(stats.average_response_time >= 0.0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["bySeverity"]["critical"], 1);
        assert_eq!(json["totalLogs"], 4);
    }

    #[test]
    fn test_stats_on_empty_store() {
        let stats = AuditLogger::without_sinks(10).stats();
        assert_eq!(stats.total_logs, 0);
        assert_eq!(stats.error_rate, 0.0);
        assert_eq!(stats.average_response_time, 0.0);
    }

    #[test]
    fn test_clear_logs() {
        let logger = AuditLogger::without_sinks(10);
        logger.log_success(&ctx(&logger, "contacts", "list"), 200, None);
        logger.clear_logs();
        assert!(logger.recent_logs(10).is_empty());
    }

    #[test]
    fn test_every_sink_receives_entry() {
        let counter = Arc::new(CountingSink(AtomicUsize::new(0)));
        let logger = AuditLogger::without_sinks(10)
            .with_sink(counter.clone())
            .with_sink(Arc::new(TracingSink::new()));

        logger.log_success(&ctx(&logger, "contacts", "list"), 200, None);
        logger.log_error(&ctx(&logger, "contacts", "list"), 500, "x", None);

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sink_failures_do_not_propagate() {
        let counter = Arc::new(CountingSink(AtomicUsize::new(0)));
        let logger = AuditLogger::without_sinks(10)
            .with_sink(Arc::new(FailingSink))
            .with_sink(Arc::new(PanickingSink))
            .with_sink(counter.clone());

        let entry = logger.log_error(&ctx(&logger, "ban", "create"), 500, "boom", None);

        assert!(entry.is_some());
        assert_eq!(logger.recent_logs(10).len(), 1);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}
