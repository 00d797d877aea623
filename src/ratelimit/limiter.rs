//! Fixed-window admission control.
//!
//! Each key gets a counter that resets entirely when its window ends. A burst
//! of up to twice the ceiling can straddle a window boundary; that is the
//! accepted cost of the fixed-window scheme.
//!
//! # Tracing Events
//!
//! - `gatehouse.ratelimit.reset` - A single key was removed administratively

use super::policy::AdmissionPolicy;
use super::store::{RateLimitEntry, RateLimitStore};
use crate::clock::{Clock, SystemClock};
use crate::http::RequestMeta;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one admission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Ceiling of the policy that produced this decision.
    pub limit: u32,
    pub remaining: u32,
    /// End of the current window, epoch milliseconds.
    pub reset_time: u64,
    /// Whole seconds until the window ends. Only set on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl RateLimitDecision {
    /// `reset_time` as an RFC 3339 / ISO-8601 string with millisecond precision.
    pub fn reset_time_iso(&self) -> String {
        i64::try_from(self.reset_time)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Point-in-time view of the counter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStats {
    pub total_keys: usize,
    /// Keys whose window has not ended. Never exceeds `total_keys`.
    pub active_keys: usize,
    /// Heuristic byte estimate of the table.
    pub memory_usage: usize,
}

/// Admission control as seen by handlers.
///
/// The in-memory [`RateLimiter`] is the only implementation today; a shared
/// cache backend can slot in behind this trait without touching call sites.
pub trait AdmissionControl: Send + Sync {
    /// Count `req` against `policy` and decide whether it may proceed.
    fn check_limit(&self, req: &RequestMeta, policy: &AdmissionPolicy) -> RateLimitDecision;

    fn stats(&self) -> RateLimitStats;

    /// Remove every expired entry, returning how many were dropped.
    fn cleanup_expired(&self) -> usize;
}

/// In-memory fixed-window rate limiter.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<Mutex<RateLimitStore>>,
    clock: Arc<dyn Clock>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(Mutex::new(RateLimitStore::new())),
            clock,
        }
    }

    /// Count one request for an already-derived `key`.
    pub fn check_key(&self, key: &str, policy: &AdmissionPolicy) -> RateLimitDecision {
        let now = self.clock.now_millis();
        let limit = policy.max_requests().max(1);
        let mut store = self.store.lock();

        // Expired rows are dropped before every check.
        store.sweep_expired(now);

        let existing = store.get_mut(key).filter(|entry| !entry.is_expired(now));
        match existing {
            None => {
                let entry = RateLimitEntry::new(now, policy.window_millis());
                store.insert(key, entry);
                RateLimitDecision {
                    allowed: true,
                    limit,
                    remaining: limit.saturating_sub(1),
                    reset_time: entry.window_end,
                    retry_after: None,
                }
            }
            Some(entry) if entry.count >= limit => RateLimitDecision {
                allowed: false,
                limit,
                remaining: 0,
                reset_time: entry.window_end,
                retry_after: Some((entry.window_end - now).div_ceil(1000)),
            },
            Some(entry) => {
                entry.count += 1;
                RateLimitDecision {
                    allowed: true,
                    limit,
                    remaining: limit.saturating_sub(entry.count),
                    reset_time: entry.window_end,
                    retry_after: None,
                }
            }
        }
    }

    /// Current entry for `key`, if one exists.
    pub fn entry(&self, key: &str) -> Option<RateLimitEntry> {
        self.store.lock().get(key).copied()
    }

    /// Forget `key` entirely, giving it a fresh window on its next request.
    pub fn reset(&self, key: &str) -> bool {
        let removed = self.store.lock().remove(key).is_some();
        if removed {
            tracing::info!(target: "gatehouse.ratelimit.reset", key = %key, "Rate limit key reset");
        }
        removed
    }

    pub fn clear(&self) {
        self.store.lock().clear();
    }
}

impl AdmissionControl for RateLimiter {
    fn check_limit(&self, req: &RequestMeta, policy: &AdmissionPolicy) -> RateLimitDecision {
        let key = policy.key_for(req);
        self.check_key(&key, policy)
    }

    fn stats(&self) -> RateLimitStats {
        let now = self.clock.now_millis();
        let store = self.store.lock();
        RateLimitStats {
            total_keys: store.len(),
            active_keys: store.active_count(now),
            memory_usage: store.estimated_memory(),
        }
    }

    fn cleanup_expired(&self) -> usize {
        let now = self.clock.now_millis();
        self.store.lock().sweep_expired(now)
    }
}
