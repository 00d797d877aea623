//! Admin-only HTTP endpoint for reading the audit trail.
//!
//! The endpoint is itself governed: it is admitted under the admin policy and
//! every call, including refused ones, is recorded as `audit-logs.query`.
//!
//! ```rust,ignore
//! let state = AuditRoutesState::new(governance.clone(), Arc::new(MyResolver));
//! let app = Router::new().nest("/admin", audit_routes(state));
//! ```

use super::entry::AuditLogEntry;
use super::logger::{AuditStats, AuditTrail};
use super::severity::Severity;
use crate::cors::preflight_response;
use crate::error::GovernanceError;
use crate::governance::Governance;
use crate::http::{ApiResponse, RequestMeta};
use crate::ratelimit::{PolicyKind, apply_rate_limit_headers};
use async_trait::async_trait;
use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, Method, Uri, header::ORIGIN},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_LIMIT: usize = 100;

/// Role granted access to the audit trail.
pub const ADMIN_ROLE: &str = "ADMIN";

/// Caller identity resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub role: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Resolves bearer tokens to identities.
///
/// Token verification lives with the host application; this crate only asks
/// who the caller is.
#[async_trait]
pub trait IdentityResolver: Send + Sync + 'static {
    /// `None` when the token is unknown, expired or malformed.
    async fn resolve(&self, token: &str) -> Option<Identity>;
}

#[derive(Clone)]
pub struct AuditRoutesState {
    pub governance: Arc<Governance>,
    pub resolver: Arc<dyn IdentityResolver>,
}

impl AuditRoutesState {
    pub fn new(governance: Arc<Governance>, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self {
            governance,
            resolver,
        }
    }
}

/// Raw query string. `limit` is parsed leniently: anything that is not a
/// positive integer falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQueryParams {
    pub limit: Option<String>,
    pub severity: Option<String>,
    pub function: Option<String>,
    pub action: Option<String>,
}

/// Filters echoed back in the response.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedFilters {
    pub limit: usize,
    pub severity: Option<Severity>,
    pub function: Option<String>,
    pub action: Option<String>,
}

impl AppliedFilters {
    fn parse(params: AuditQueryParams) -> Result<Self, GovernanceError> {
        let limit = params
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<usize>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT);

        let severity = params
            .severity
            .as_deref()
            .map(str::parse::<Severity>)
            .transpose()
            .map_err(|e| GovernanceError::bad_request(e.to_string()))?;

        Ok(Self {
            limit,
            severity,
            function: params.function.filter(|f| !f.is_empty()),
            action: params.action.filter(|a| !a.is_empty()),
        })
    }

    fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.severity.is_none_or(|s| entry.severity == s)
            && self.function.as_deref().is_none_or(|f| entry.function == f)
            && self.action.as_deref().is_none_or(|a| entry.action == a)
    }
}

#[derive(Debug, Serialize)]
pub struct AuditQueryData {
    pub logs: Vec<AuditLogEntry>,
    pub stats: AuditStats,
    pub filters: AppliedFilters,
    pub total: usize,
}

/// Router exposing `GET /audit-logs` and its preflight.
pub fn audit_routes(state: AuditRoutesState) -> Router {
    Router::new()
        .route("/audit-logs", get(query_audit_logs).options(audit_logs_preflight))
        .with_state(state)
}

async fn audit_logs_preflight(
    State(state): State<AuditRoutesState>,
    headers: HeaderMap,
) -> Response {
    let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());
    preflight_response(state.governance.cors(), origin)
}

async fn query_audit_logs(
    State(state): State<AuditRoutesState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<AuditQueryParams>,
) -> Response {
    let meta = RequestMeta::new(method, uri, headers);
    let governance = &state.governance;

    let decision = match governance.admit_with(&meta, PolicyKind::Admin) {
        Ok(decision) => decision,
        Err(rejection) => return rejection,
    };

    let audit = governance.audit();
    let mut ctx = audit.create_request_context(&meta, "audit-logs", "query", None, None, None);

    let identity = match meta.bearer_token() {
        Some(token) => state.resolver.resolve(token).await,
        None => None,
    };
    let Some(identity) = identity else {
        let err = GovernanceError::unauthorized("Authentication required");
        audit.log_warning(&ctx, 401, "Missing or invalid bearer token", None);
        return refuse(governance, &meta, err);
    };

    ctx = ctx.with_user(
        Some(identity.user_id.clone()),
        identity.email.clone(),
        Some(identity.role.clone()),
    );
    if !identity.is_admin() {
        audit.log_warning(&ctx, 403, "Non-admin attempted to read audit logs", None);
        return refuse(governance, &meta, GovernanceError::forbidden("Admin access required"));
    }

    let filters = match AppliedFilters::parse(params) {
        Ok(filters) => filters,
        Err(err) => {
            audit.log_warning(&ctx, 400, &err.safe_message(), None);
            return refuse(governance, &meta, err);
        }
    };

    let data = collect(audit.recent_logs(filters.limit), audit.stats(), filters);
    let total = data.total;

    let mut response =
        ApiResponse::success(data).into_response_with_headers(governance.cors_headers(&meta));
    apply_rate_limit_headers(&mut response, &decision);

    audit.log_success(&ctx, 200, Some(serde_json::json!({ "returned": total })));
    response
}

fn collect(
    recent: Vec<AuditLogEntry>,
    stats: AuditStats,
    filters: AppliedFilters,
) -> AuditQueryData {
    let logs: Vec<AuditLogEntry> = recent
        .into_iter()
        .rev()
        .filter(|entry| filters.matches(entry))
        .collect();
    AuditQueryData {
        total: logs.len(),
        logs,
        stats,
        filters,
    }
}

fn refuse(governance: &Governance, meta: &RequestMeta, err: GovernanceError) -> Response {
    let mut response = err.into_response();
    response
        .headers_mut()
        .extend(governance.cors_headers(meta));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditLogger, AuditOutcome};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct FixedTokens;

    #[async_trait]
    impl IdentityResolver for FixedTokens {
        async fn resolve(&self, token: &str) -> Option<Identity> {
            let role = match token {
                "admin-token" => ADMIN_ROLE,
                "member-token" => "MEMBER",
                _ => return None,
            };
            Some(Identity {
                user_id: format!("user-{token}"),
                email: Some(format!("{token}@example.org")),
                role: role.to_string(),
            })
        }
    }

    fn setup() -> (Router, Arc<Governance>) {
        let governance = Arc::new(
            Governance::builder()
                .audit(Arc::new(AuditLogger::without_sinks(100)))
                .without_janitor()
                .build(),
        );
        let app = audit_routes(AuditRoutesState::new(governance.clone(), Arc::new(FixedTokens)));
        (app, governance)
    }

    fn get_logs(query: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .uri(format!("/audit-logs{query}"))
            .header("x-forwarded-for", "198.51.100.9");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_limit_parsing_is_lenient() {
        let parse = |limit: &str| {
            AppliedFilters::parse(AuditQueryParams {
                limit: Some(limit.to_string()),
                ..Default::default()
            })
            .unwrap()
            .limit
        };
        assert_eq!(parse("25"), 25);
        assert_eq!(parse("abc"), DEFAULT_LIMIT);
        assert_eq!(parse("0"), DEFAULT_LIMIT);
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let err = AppliedFilters::parse(AuditQueryParams {
            severity: Some("fatal".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, GovernanceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized_and_audited() {
        let (app, governance) = setup();

        let response = app.oneshot(get_logs("", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("access-control-allow-origin"));

        let logs = governance.audit().logs_by_function("audit-logs");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status_code, 401);
        assert_eq!(logs[0].severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let (app, governance) = setup();

        let response = app
            .oneshot(get_logs("", Some("member-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let logs = governance.audit().recent_logs(10);
        assert_eq!(logs[0].user_role.as_deref(), Some("MEMBER"));
    }

    #[tokio::test]
    async fn test_admin_sees_filtered_logs_most_recent_first() {
        let (app, governance) = setup();
        let audit = governance.audit();
        let meta = RequestMeta::default();

        for (function, status) in [("contacts", 200), ("leaders", 500), ("contacts", 404)] {
            let ctx = audit.create_request_context(&meta, function, "list", None, None, None);
            audit.record(&ctx, status, AuditOutcome::Success, None);
        }

        let response = app
            .oneshot(get_logs("?function=contacts", Some("admin-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-limit"], "50");

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["total"], 2);
        assert_eq!(json["data"]["logs"][0]["statusCode"], 404);
        assert_eq!(json["data"]["logs"][1]["statusCode"], 200);
        assert_eq!(json["data"]["filters"]["function"], "contacts");
        assert_eq!(json["data"]["stats"]["totalLogs"], 3);

        let own = audit.logs_by_function("audit-logs");
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].severity, Severity::Info);
    }

    #[tokio::test]
    async fn test_preflight() {
        let (app, _) = setup();
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/audit-logs")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:3000"
        );
    }
}
