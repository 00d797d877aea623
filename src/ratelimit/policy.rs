//! Admission policies.
//!
//! Four fixed policies cover every governed endpoint. They are built once at
//! process start and never mutated; destructive or privileged operations
//! (invitations, bans) get the tightest ceilings.

use super::key::KeyStrategy;
use crate::http::RequestMeta;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MINUTE: u64 = 60;

/// Window length, request ceiling and key strategy for one class of endpoint.
///
/// Immutable once built. Both [`AdmissionPolicy::new`] and deserialization
/// guarantee a window of at least 1ms and a ceiling of at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicySpec")]
pub struct AdmissionPolicy {
    name: String,
    window: Duration,
    max_requests: u32,
    key_strategy: KeyStrategy,
}

/// Unvalidated wire form of an [`AdmissionPolicy`].
#[derive(Deserialize)]
struct PolicySpec {
    name: String,
    window: Duration,
    max_requests: u32,
    key_strategy: KeyStrategy,
}

/// Error returned when a deserialized policy cannot admit anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPolicy {
    #[error("policy {0}: max_requests must be greater than 0")]
    ZeroCeiling(String),

    #[error("policy {0}: window must be at least 1ms")]
    ZeroWindow(String),
}

impl TryFrom<PolicySpec> for AdmissionPolicy {
    type Error = InvalidPolicy;

    fn try_from(spec: PolicySpec) -> Result<Self, Self::Error> {
        if spec.max_requests == 0 {
            return Err(InvalidPolicy::ZeroCeiling(spec.name));
        }
        if spec.window < Duration::from_millis(1) {
            return Err(InvalidPolicy::ZeroWindow(spec.name));
        }
        Ok(Self::new(spec.name, spec.window, spec.max_requests, spec.key_strategy))
    }
}

impl AdmissionPolicy {
    /// Build a policy. Zero windows and ceilings are clamped up to the
    /// smallest meaningful value.
    pub fn new(
        name: impl Into<String>,
        window: Duration,
        max_requests: u32,
        key_strategy: KeyStrategy,
    ) -> Self {
        Self {
            name: name.into(),
            window: window.max(Duration::from_millis(1)),
            max_requests: max_requests.max(1),
            key_strategy,
        }
    }

    /// Name used in logs and diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length of each fixed window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Requests admitted per key per window. Always at least 1.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        self.key_strategy
    }

    /// 100 requests per 15 minutes, keyed by IP and user-agent.
    pub fn general() -> Self {
        Self::new(
            "general",
            Duration::from_secs(15 * MINUTE),
            100,
            KeyStrategy::ClientFingerprint,
        )
    }

    /// 10 requests per hour, keyed by IP.
    pub fn invite() -> Self {
        Self::new(
            "invite",
            Duration::from_secs(60 * MINUTE),
            10,
            KeyStrategy::ClientIp,
        )
    }

    /// 50 requests per 5 minutes, keyed by IP and token prefix.
    pub fn admin() -> Self {
        Self::new(
            "admin",
            Duration::from_secs(5 * MINUTE),
            50,
            KeyStrategy::AdminToken,
        )
    }

    /// 5 requests per hour, keyed by IP and token prefix.
    pub fn ban() -> Self {
        Self::new(
            "ban",
            Duration::from_secs(60 * MINUTE),
            5,
            KeyStrategy::BanToken,
        )
    }

    pub fn window_millis(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn key_for(&self, req: &RequestMeta) -> String {
        self.key_strategy.key_for(req)
    }
}

/// Names of the built-in policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    General,
    Invite,
    Admin,
    Ban,
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::General => write!(f, "general"),
            Self::Invite => write!(f, "invite"),
            Self::Admin => write!(f, "admin"),
            Self::Ban => write!(f, "ban"),
        }
    }
}

/// The fixed policy table handlers pick from.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    general: AdmissionPolicy,
    invite: AdmissionPolicy,
    admin: AdmissionPolicy,
    ban: AdmissionPolicy,
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self {
            general: AdmissionPolicy::general(),
            invite: AdmissionPolicy::invite(),
            admin: AdmissionPolicy::admin(),
            ban: AdmissionPolicy::ban(),
        }
    }
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: PolicyKind) -> &AdmissionPolicy {
        match kind {
            PolicyKind::General => &self.general,
            PolicyKind::Invite => &self.invite,
            PolicyKind::Admin => &self.admin,
            PolicyKind::Ban => &self.ban,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PolicyKind, &AdmissionPolicy)> {
        [
            PolicyKind::General,
            PolicyKind::Invite,
            PolicyKind::Admin,
            PolicyKind::Ban,
        ]
        .into_iter()
        .map(move |kind| (kind, self.get(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_policy_table() {
        let registry = PolicyRegistry::new();

        let general = registry.get(PolicyKind::General);
        assert_eq!(general.window, Duration::from_secs(900));
        assert_eq!(general.max_requests, 100);
        assert_eq!(general.key_strategy, KeyStrategy::ClientFingerprint);

        let invite = registry.get(PolicyKind::Invite);
        assert_eq!(invite.window, Duration::from_secs(3600));
        assert_eq!(invite.max_requests, 10);
        assert_eq!(invite.key_strategy, KeyStrategy::ClientIp);

        let admin = registry.get(PolicyKind::Admin);
        assert_eq!(admin.window, Duration::from_secs(300));
        assert_eq!(admin.max_requests, 50);
        assert_eq!(admin.key_strategy, KeyStrategy::AdminToken);

        let ban = registry.get(PolicyKind::Ban);
        assert_eq!(ban.window, Duration::from_secs(3600));
        assert_eq!(ban.max_requests, 5);
        assert_eq!(ban.key_strategy, KeyStrategy::BanToken);
    }

    #[test]
    fn test_new_clamps_degenerate_values() {
        let policy = AdmissionPolicy::new("zero", Duration::ZERO, 0, KeyStrategy::ClientIp);
        assert_eq!(policy.max_requests, 1);
        assert_eq!(policy.window_millis(), 1);
    }

    #[test]
    fn test_registry_iterates_every_kind() {
        let registry = PolicyRegistry::new();
        let names: Vec<String> = registry.iter().map(|(kind, _)| kind.to_string()).collect();
        assert_eq!(names, vec!["general", "invite", "admin", "ban"]);
        assert!(registry.iter().all(|(kind, p)| p.name() == kind.to_string()));
    }

    #[test]
    fn test_deserialize_rejects_zero_ceiling() {
        let spec = |window_secs: u64, max_requests: u32| {
            serde_json::json!({
                "name": "open",
                "window": { "secs": window_secs, "nanos": 0 },
                "max_requests": max_requests,
                "key_strategy": "client_ip",
            })
        };

        let err = serde_json::from_value::<AdmissionPolicy>(spec(60, 0)).unwrap_err();
        assert!(err.to_string().contains("max_requests must be greater than 0"));

        let err = serde_json::from_value::<AdmissionPolicy>(spec(0, 5)).unwrap_err();
        assert!(err.to_string().contains("window must be at least 1ms"));

        assert!(serde_json::from_value::<AdmissionPolicy>(spec(60, 5)).is_ok());
    }

    #[test]
    fn test_serialized_policy_reloads() {
        let json = serde_json::to_string(&AdmissionPolicy::ban()).unwrap();
        let policy: AdmissionPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(policy, AdmissionPolicy::ban());
        assert_eq!(policy.max_requests(), 5);
    }
}
