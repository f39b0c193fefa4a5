//! Counters for the indexed map
//!
//! - Counters only, monotonic
//! - Relaxed atomics: values are exact once both roles are quiescent

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters shared by the foreground and background roles.
#[derive(Debug, Default)]
pub struct IndexMetrics {
    /// Insert / remove / clear calls
    mutations: AtomicU64,
    /// Rebuilds started from the first entry
    builds_started: AtomicU64,
    /// Rebuilds that reached Stable
    builds_completed: AtomicU64,
    /// Rebuilds abandoned for a mutation
    builds_abandoned: AtomicU64,
    /// Level-1 entries written across all builds
    entries_indexed: AtomicU64,
    /// Lookups answered through the index
    indexed_lookups: AtomicU64,
    /// Lookups answered by the container directly
    direct_lookups: AtomicU64,
}

impl IndexMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_mutations(&self) {
        self.mutations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_builds_started(&self) {
        self.builds_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_builds_completed(&self) {
        self.builds_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_builds_abandoned(&self) {
        self.builds_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_entries_indexed(&self, entries: u64) {
        self.entries_indexed.fetch_add(entries, Ordering::Relaxed);
    }

    pub fn increment_indexed_lookups(&self) {
        self.indexed_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_direct_lookups(&self) {
        self.direct_lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            mutations: self.mutations.load(Ordering::Relaxed),
            builds_started: self.builds_started.load(Ordering::Relaxed),
            builds_completed: self.builds_completed.load(Ordering::Relaxed),
            builds_abandoned: self.builds_abandoned.load(Ordering::Relaxed),
            entries_indexed: self.entries_indexed.load(Ordering::Relaxed),
            indexed_lookups: self.indexed_lookups.load(Ordering::Relaxed),
            direct_lookups: self.direct_lookups.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub mutations: u64,
    pub builds_started: u64,
    pub builds_completed: u64,
    pub builds_abandoned: u64,
    pub entries_indexed: u64,
    pub indexed_lookups: u64,
    pub direct_lookups: u64,
}

impl MetricsSnapshot {
    /// Serialize as one JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Total lookups on either path
    pub fn lookups(&self) -> u64 {
        self.indexed_lookups + self.direct_lookups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        let metrics = IndexMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters() {
        let metrics = IndexMetrics::new();

        metrics.increment_mutations();
        metrics.increment_mutations();
        metrics.increment_builds_started();
        metrics.add_entries_indexed(300);
        metrics.increment_indexed_lookups();
        metrics.increment_direct_lookups();
        metrics.increment_direct_lookups();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.mutations, 2);
        assert_eq!(snapshot.builds_started, 1);
        assert_eq!(snapshot.entries_indexed, 300);
        assert_eq!(snapshot.lookups(), 3);
    }

    #[test]
    fn test_to_json() {
        let metrics = IndexMetrics::new();
        metrics.increment_builds_completed();

        let json = metrics.snapshot().to_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["builds_completed"], 1);
        assert_eq!(parsed["builds_abandoned"], 0);
    }
}
