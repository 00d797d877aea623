//! HTTP rendering of admission decisions.

use super::limiter::RateLimitDecision;
use axum::{
    Json,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// JSON body of a 429 response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitExceeded {
    pub error: String,
    pub message: String,
    pub retry_after: u64,
    /// ISO-8601 end of the current window.
    pub reset_time: String,
}

impl RateLimitExceeded {
    pub fn from_decision(decision: &RateLimitDecision) -> Self {
        Self {
            error: "Rate limit exceeded".to_string(),
            message: "Too many requests. Please try again later.".to_string(),
            retry_after: decision.retry_after.unwrap_or(0),
            reset_time: decision.reset_time_iso(),
        }
    }
}

/// Build the 429 response for a rejected decision.
///
/// `cors` carries the negotiated CORS headers for the caller's origin so
/// browsers can read the rejection.
pub fn rate_limited_response(decision: &RateLimitDecision, cors: HeaderMap) -> Response {
    let body = RateLimitExceeded::from_decision(decision);
    let retry_after = body.retry_after;

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.extend(cors);
    insert_rate_limit_headers(headers, decision);
    headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

/// Attach `X-RateLimit-*` headers to an admitted response.
pub fn apply_rate_limit_headers(response: &mut Response, decision: &RateLimitDecision) {
    insert_rate_limit_headers(response.headers_mut(), decision);
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_time));
}
