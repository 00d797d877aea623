//! Audit entries and the per-request context they are built from.

use super::severity::Severity;
use crate::http::RequestMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Identity and network snapshot taken when a handler starts.
///
/// Built by `AuditLogger::create_request_context`; consumed when the handler
/// reports its outcome.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub function: String,
    pub action: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub user_role: Option<String>,
    pub ip: String,
    pub user_agent: String,
    pub method: String,
    pub endpoint: String,
    started_at: Instant,
}

impl RequestContext {
    pub fn new(req: &RequestMeta, function: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            request_id: req
                .request_id()
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            function: function.into(),
            action: action.into(),
            user_id: None,
            user_email: None,
            user_role: None,
            ip: req.client_ip(),
            user_agent: req.user_agent(),
            method: req.method_str().to_string(),
            endpoint: req.endpoint().to_string(),
            started_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_user(
        mut self,
        user_id: Option<String>,
        user_email: Option<String>,
        user_role: Option<String>,
    ) -> Self {
        self.user_id = user_id;
        self.user_email = user_email;
        self.user_role = user_role;
        self
    }

    /// Milliseconds since the context was created.
    pub fn elapsed_millis(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// What the handler is reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditOutcome {
    Success,
    Warning(String),
    Error(String),
}

impl AuditOutcome {
    /// Message stored in the entry's `error` field.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Warning(msg) | Self::Error(msg) => Some(msg),
        }
    }
}

/// One audited request. Never mutated after it is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub function: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    pub ip: String,
    pub user_agent: String,
    pub method: String,
    pub endpoint: String,
    pub status_code: u16,
    /// Milliseconds between context creation and the outcome report.
    pub response_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub severity: Severity,
}

impl AuditLogEntry {
    /// Build the entry for `ctx` finishing with `status_code` and `outcome`.
    pub fn build(
        ctx: &RequestContext,
        status_code: u16,
        outcome: &AuditOutcome,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        let error = outcome.message().map(str::to_string);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            request_id: ctx.request_id.clone(),
            timestamp: Utc::now(),
            function: ctx.function.clone(),
            action: ctx.action.clone(),
            user_id: ctx.user_id.clone(),
            user_email: ctx.user_email.clone(),
            user_role: ctx.user_role.clone(),
            ip: ctx.ip.clone(),
            user_agent: ctx.user_agent.clone(),
            method: ctx.method.clone(),
            endpoint: ctx.endpoint.clone(),
            status_code,
            response_time: ctx.elapsed_millis(),
            severity: Severity::classify(status_code, error.is_some()),
            error,
            metadata,
        }
    }

    /// Single-line console rendering.
    pub fn summary_line(&self) -> String {
        let user = self
            .user_email
            .as_deref()
            .or(self.user_id.as_deref())
            .unwrap_or("anonymous");
        let mut line = format!(
            "[{}] {}.{} {} {} -> {} ({}ms) user={} ip={}",
            self.severity.as_str().to_uppercase(),
            self.function,
            self.action,
            self.method,
            self.endpoint,
            self.status_code,
            self.response_time,
            user,
            self.ip,
        );
        if let Some(error) = &self.error {
            line.push_str(" error=");
            line.push_str(error);
        }
        line
    }
}
