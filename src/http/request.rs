//! Snapshot of the inbound request fields governance cares about.
//!
//! Header extraction never fails: a missing, empty or non-UTF-8 header
//! degrades to [`UNKNOWN`] so a malformed request cannot crash the handler
//! that is evaluating it.

use axum::http::{HeaderMap, Method, Request, Uri, header, request::Parts};

/// Placeholder used whenever a network field cannot be determined.
pub const UNKNOWN: &str = "unknown";

/// Headers consulted, in order, to find the originating client address.
const CLIENT_IP_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// The parts of a request used for identity keys and audit entries.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestMeta {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    /// Capture method, uri and headers from a full request without consuming it.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            method: req.method().clone(),
            uri: req.uri().clone(),
            headers: req.headers().clone(),
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
        }
    }

    /// First address found in `x-forwarded-for`, `x-real-ip`, `cf-connecting-ip`.
    ///
    /// `x-forwarded-for` may hold a chain ("client, proxy1, proxy2"); the
    /// leftmost entry is the original client.
    pub fn client_ip(&self) -> String {
        CLIENT_IP_HEADERS
            .iter()
            .find_map(|name| {
                header_str(&self.headers, name)
                    .map(|value| value.split(',').next().unwrap_or(value).trim())
                    .filter(|value| !value.is_empty())
            })
            .unwrap_or(UNKNOWN)
            .to_string()
    }

    pub fn user_agent(&self) -> String {
        header_str(&self.headers, header::USER_AGENT.as_str())
            .unwrap_or(UNKNOWN)
            .to_string()
    }

    /// Bearer token from the `Authorization` header, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        header_str(&self.headers, header::AUTHORIZATION.as_str())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Request correlation id from `x-request-id`.
    pub fn request_id(&self) -> Option<&str> {
        header_str(&self.headers, "x-request-id")
    }

    pub fn origin(&self) -> Option<&str> {
        header_str(&self.headers, header::ORIGIN.as_str())
    }

    pub fn method_str(&self) -> &str {
        self.method.as_str()
    }

    pub fn endpoint(&self) -> &str {
        self.uri.path()
    }
}

impl<B> From<&Request<B>> for RequestMeta {
    fn from(req: &Request<B>) -> Self {
        Self::from_request(req)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderValue;

    fn meta(headers: &[(&str, &str)]) -> RequestMeta {
        let mut builder = Request::builder().method("POST").uri("/api/contacts?page=2");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        RequestMeta::from_request(&builder.body(Body::empty()).unwrap())
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for_leftmost() {
        let req = meta(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(req.client_ip(), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_falls_through_header_order() {
        assert_eq!(meta(&[("x-real-ip", "198.51.100.2")]).client_ip(), "198.51.100.2");
        assert_eq!(
            meta(&[("cf-connecting-ip", "192.0.2.9")]).client_ip(),
            "192.0.2.9"
        );
        assert_eq!(meta(&[]).client_ip(), UNKNOWN);
    }

    #[test]
    fn test_non_utf8_headers_degrade_to_unknown() {
        let mut req = meta(&[]);
        req.headers.insert(
            "user-agent",
            HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap(),
        );
        req.headers.insert(
            "x-forwarded-for",
            HeaderValue::from_bytes(&[0xc0]).unwrap(),
        );
        assert_eq!(req.user_agent(), UNKNOWN);
        assert_eq!(req.client_ip(), UNKNOWN);
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(
            meta(&[("authorization", "Bearer abcdefghijkl")]).bearer_token(),
            Some("abcdefghijkl")
        );
        assert_eq!(meta(&[("authorization", "Basic xyz")]).bearer_token(), None);
        assert_eq!(meta(&[("authorization", "Bearer ")]).bearer_token(), None);
    }

    #[test]
    fn test_endpoint_is_path_only() {
        let req = meta(&[]);
        assert_eq!(req.endpoint(), "/api/contacts");
        assert_eq!(req.method_str(), "POST");
    }
}
