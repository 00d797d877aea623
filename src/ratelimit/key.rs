//! Identity key strategies.
//!
//! A key buckets rate-limit counters per caller. Token-based strategies use
//! only the first eight characters of the bearer token, which approximates
//! per-caller identity without validating the token here.

use crate::http::RequestMeta;
use serde::{Deserialize, Serialize};

/// Number of bearer token characters folded into token-based keys.
pub const TOKEN_PREFIX_LEN: usize = 8;

/// Key component used when no bearer token is present.
const NO_TOKEN: &str = "anonymous";

/// How a request is mapped to its rate-limit identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// Client IP plus user-agent, namespaced for general traffic.
    ClientFingerprint,
    /// Client IP only, namespaced for invitations.
    ClientIp,
    /// Client IP plus bearer token prefix, namespaced for admin operations.
    AdminToken,
    /// Client IP plus bearer token prefix, namespaced for bans.
    BanToken,
}

impl KeyStrategy {
    /// Derive the identity key for `req`.
    pub fn key_for(&self, req: &RequestMeta) -> String {
        let ip = req.client_ip();
        match self {
            Self::ClientFingerprint => format!("general-{}-{}", ip, req.user_agent()),
            Self::ClientIp => format!("invite-{}", ip),
            Self::AdminToken => format!("admin-{}-{}", ip, token_prefix(req)),
            Self::BanToken => format!("ban-{}-{}", ip, token_prefix(req)),
        }
    }
}

fn token_prefix(req: &RequestMeta) -> String {
    req.bearer_token()
        .map(|token| token.chars().take(TOKEN_PREFIX_LEN).collect())
        .unwrap_or_else(|| NO_TOKEN.to_string())
}
