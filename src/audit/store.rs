//! Bounded in-memory audit history.

use super::entry::AuditLogEntry;
use std::collections::VecDeque;

/// Default number of entries retained.
pub const DEFAULT_MAX_LOGS: usize = 1000;

/// Arrival-ordered entries, never longer than `max_logs`.
///
/// When full, the oldest entry is evicted to make room for the newest.
#[derive(Debug)]
pub struct AuditLogStore {
    entries: VecDeque<AuditLogEntry>,
    max_logs: usize,
}

impl Default for AuditLogStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOGS)
    }
}

impl AuditLogStore {
    /// A capacity of zero is treated as one.
    pub fn new(max_logs: usize) -> Self {
        let max_logs = max_logs.max(1);
        Self {
            entries: VecDeque::with_capacity(max_logs.min(DEFAULT_MAX_LOGS)),
            max_logs,
        }
    }

    pub fn push(&mut self, entry: AuditLogEntry) {
        while self.entries.len() >= self.max_logs {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// The most recent `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<AuditLogEntry> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuditLogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_logs(&self) -> usize {
        self.max_logs
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditOutcome, RequestContext};
    use crate::http::RequestMeta;

    fn entry(action: &str) -> AuditLogEntry {
        let ctx = RequestContext::new(&RequestMeta::default(), "contacts", action);
        AuditLogEntry::build(&ctx, 200, &AuditOutcome::Success, None)
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut store = AuditLogStore::new(3);
        for action in ["a", "b", "c", "d", "e"] {
            store.push(entry(action));
        }

        assert_eq!(store.len(), 3);
        let actions: Vec<String> = store.iter().map(|e| e.action.clone()).collect();
        assert_eq!(actions, vec!["c", "d", "e"]);
    }

    #[test]
    fn test_recent_returns_tail_in_arrival_order() {
        let mut store = AuditLogStore::new(10);
        for action in ["a", "b", "c"] {
            store.push(entry(action));
        }

        let recent: Vec<String> = store.recent(2).into_iter().map(|e| e.action).collect();
        assert_eq!(recent, vec!["b", "c"]);
        assert_eq!(store.recent(50).len(), 3);
        assert!(store.recent(0).is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let mut store = AuditLogStore::new(0);
        store.push(entry("a"));
        store.push(entry("b"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.iter().next().unwrap().action, "b");
    }
}
