use super::config::CorsConfig;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Compute the CORS headers for a request from `origin`.
///
/// Allowed origins are echoed back; anything else (including a missing
/// `Origin`) gets the configured default origin. `Vary: Origin` is always set
/// so caches key on the origin.
pub fn cors_headers(config: &CorsConfig, origin: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let chosen = origin
        .filter(|o| config.is_allowed(o))
        .unwrap_or(&config.default_origin);
    if let Ok(value) = HeaderValue::from_str(chosen) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }

    if let Ok(value) = HeaderValue::from_str(&config.allowed_methods.join(", ")) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value);
    }

    if let Ok(value) = HeaderValue::from_str(&config.allowed_headers.join(", ")) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
    }

    if config.allow_credentials {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }

    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from(config.max_age_seconds),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));

    headers
}

/// 204 answer to an `OPTIONS` preflight.
pub fn preflight_response(config: &CorsConfig, origin: Option<&str>) -> Response {
    (StatusCode::NO_CONTENT, cors_headers(config, origin)).into_response()
}
