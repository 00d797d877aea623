//! In-memory fixed-window counters.
//!
//! State is per process: counters are not shared between instances, so the
//! limits enforced here are a per-instance approximation.

use std::collections::HashMap;

/// Counter for one identity key within one fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// Requests counted since `window_start`. Always at least 1.
    pub count: u32,
    /// Epoch milliseconds.
    pub window_start: u64,
    /// Epoch milliseconds. The window is live while `now <= window_end`.
    pub window_end: u64,
}

impl RateLimitEntry {
    pub fn new(now: u64, window_millis: u64) -> Self {
        Self {
            count: 1,
            window_start: now,
            window_end: now.saturating_add(window_millis),
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now > self.window_end
    }
}

/// Map from identity key to its current window.
#[derive(Debug, Default)]
pub struct RateLimitStore {
    entries: HashMap<String, RateLimitEntry>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&RateLimitEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RateLimitEntry> {
        self.entries.get_mut(key)
    }

    /// Insert or replace the entry for `key`.
    pub fn insert(&mut self, key: impl Into<String>, entry: RateLimitEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn remove(&mut self, key: &str) -> Option<RateLimitEntry> {
        self.entries.remove(key)
    }

    /// Drop every entry whose window ended before `now`. Returns how many
    /// entries were removed.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.window_end >= now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose window is still open at `now`.
    pub fn active_count(&self, now: u64) -> usize {
        self.entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Rough byte footprint: key bytes plus the fixed entry size per slot.
    pub fn estimated_memory(&self) -> usize {
        let slot = std::mem::size_of::<String>() + std::mem::size_of::<RateLimitEntry>();
        self.entries.keys().map(|key| key.len() + slot).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
