//! The governance service shared by every handler.
//!
//! Built once at process start and handed to handlers by `Arc`. Both the
//! counter table and the audit history live in this process only: separate
//! instances do not see each other's state, so limits and history are
//! per-instance approximations.
//!
//! # Tracing Events
//!
//! - `gatehouse.ratelimit.rejected` - A request was refused admission

use crate::audit::{AuditLogger, AuditSink, AuditTrail};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::cors::{CorsConfig, cors_headers};
use crate::http::RequestMeta;
use crate::ratelimit::{
    AdmissionControl, AdmissionPolicy, JanitorHandle, PolicyKind, PolicyRegistry,
    RateLimitDecision, RateLimiter, rate_limited_response, spawn_janitor,
};
use axum::http::HeaderMap;
use axum::response::Response;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Admission control, audit trail and CORS negotiation behind one handle.
pub struct Governance {
    admission: Arc<dyn AdmissionControl>,
    audit: Arc<dyn AuditTrail>,
    policies: PolicyRegistry,
    cors: CorsConfig,
    janitor: Mutex<Option<JanitorHandle>>,
}

impl Governance {
    pub fn builder() -> GovernanceBuilder {
        GovernanceBuilder::new()
    }

    /// Build from configuration with the default in-memory backends.
    pub fn from_config(config: &Config) -> Self {
        GovernanceBuilder::new().config(config.clone()).build()
    }

    /// Admission entry point handlers call before doing any work.
    ///
    /// Returns the decision when admitted, or the ready-to-send 429 response
    /// (with CORS headers for the caller's origin) when rejected.
    pub fn admit(
        &self,
        req: &RequestMeta,
        policy: &AdmissionPolicy,
    ) -> Result<RateLimitDecision, Response> {
        let decision = self.admission.check_limit(req, policy);
        if decision.allowed {
            return Ok(decision);
        }

        tracing::warn!(
            target: "gatehouse.ratelimit.rejected",
            policy = %policy.name(),
            key = %policy.key_for(req),
            endpoint = %req.endpoint(),
            retry_after_secs = decision.retry_after.unwrap_or(0),
            max_requests = policy.max_requests(),
            "Request rejected by admission control"
        );
        Err(rate_limited_response(&decision, self.cors_headers(req)))
    }

    /// [`Governance::admit`] against a built-in policy.
    pub fn admit_with(
        &self,
        req: &RequestMeta,
        kind: PolicyKind,
    ) -> Result<RateLimitDecision, Response> {
        self.admit(req, self.policies.get(kind))
    }

    pub fn policy(&self, kind: PolicyKind) -> &AdmissionPolicy {
        self.policies.get(kind)
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    /// CORS headers negotiated for the request's `Origin`.
    pub fn cors_headers(&self, req: &RequestMeta) -> HeaderMap {
        cors_headers(&self.cors, req.origin())
    }

    pub fn cors(&self) -> &CorsConfig {
        &self.cors
    }

    pub fn admission(&self) -> &Arc<dyn AdmissionControl> {
        &self.admission
    }

    pub fn audit(&self) -> &Arc<dyn AuditTrail> {
        &self.audit
    }

    pub fn janitor_running(&self) -> bool {
        self.janitor.lock().as_ref().is_some_and(JanitorHandle::is_running)
    }

    /// Stop background work. Safe to call more than once.
    pub async fn shutdown(&self) {
        let janitor = self.janitor.lock().take();
        if let Some(janitor) = janitor {
            janitor.shutdown().await;
        }
    }
}

/// Builder for [`Governance`]
#[must_use = "builder does nothing until you call build()"]
pub struct GovernanceBuilder {
    config: Config,
    clock: Option<Arc<dyn Clock>>,
    admission: Option<Arc<dyn AdmissionControl>>,
    audit: Option<Arc<dyn AuditTrail>>,
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl GovernanceBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            clock: None,
            admission: None,
            audit: None,
            sinks: Vec::new(),
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.config.cors = cors;
        self
    }

    /// Clock used by the default in-memory rate limiter.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the in-memory rate limiter.
    pub fn admission(mut self, admission: Arc<dyn AdmissionControl>) -> Self {
        self.admission = Some(admission);
        self
    }

    /// Replace the in-memory audit logger. Extra sinks are ignored.
    pub fn audit(mut self, audit: Arc<dyn AuditTrail>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Add a sink to the default audit logger.
    pub fn sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn without_janitor(mut self) -> Self {
        self.config.rate_limit.cleanup_interval_seconds = 0;
        self
    }

    /// Assemble the service. The janitor is started when an interval is
    /// configured and a tokio runtime is available.
    pub fn build(self) -> Governance {
        let Self {
            config,
            clock,
            admission,
            audit,
            sinks,
        } = self;

        let admission: Arc<dyn AdmissionControl> = match admission {
            Some(admission) => admission,
            None => {
                let clock: Arc<dyn Clock> = match clock {
                    Some(clock) => clock,
                    None => Arc::new(SystemClock::new()),
                };
                Arc::new(RateLimiter::with_clock(clock))
            }
        };

        let audit: Arc<dyn AuditTrail> = match audit {
            Some(audit) => audit,
            None => {
                let logger = sinks
                    .into_iter()
                    .fold(AuditLogger::new(config.audit.clone()), AuditLogger::with_sink);
                Arc::new(logger)
            }
        };

        let janitor = config
            .rate_limit
            .cleanup_interval()
            .and_then(|every| start_janitor(admission.clone(), every));

        Governance {
            admission,
            audit,
            policies: PolicyRegistry::new(),
            cors: config.cors,
            janitor: Mutex::new(janitor),
        }
    }
}

impl Default for GovernanceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn start_janitor(admission: Arc<dyn AdmissionControl>, every: Duration) -> Option<JanitorHandle> {
    match tokio::runtime::Handle::try_current() {
        Ok(_) => Some(spawn_janitor(admission, every)),
        Err(_) => {
            tracing::debug!(
                target: "gatehouse.ratelimit.janitor",
                "No tokio runtime; relying on request-time sweeps only"
            );
            None
        }
    }
}
