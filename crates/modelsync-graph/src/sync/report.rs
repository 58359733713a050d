//! Run summary.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters for one sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub rows: usize,
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub graph_only: usize,
    pub folders_created: usize,
    pub views_created: usize,
    pub placements_added: usize,
    pub property_failures: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::started(Utc::now())
    }
}

impl SyncReport {
    pub fn started(at: DateTime<Utc>) -> Self {
        Self {
            rows: 0,
            added: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            graph_only: 0,
            folders_created: 0,
            views_created: 0,
            placements_added: 0,
            property_failures: 0,
            started_at: at,
            finished_at: None,
        }
    }

    /// Add another report's counters. The earlier start and later finish win.
    pub fn merge(&mut self, other: &SyncReport) {
        self.rows += other.rows;
        self.added += other.added;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.graph_only += other.graph_only;
        self.folders_created += other.folders_created;
        self.views_created += other.views_created;
        self.placements_added += other.placements_added;
        self.property_failures += other.property_failures;
        self.started_at = self.started_at.min(other.started_at);
        self.finished_at = match (self.finished_at, other.finished_at) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Rows that reached the store.
    pub fn processed(&self) -> usize {
        self.added + self.updated
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.property_failures > 0
    }

    pub fn elapsed_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    /// One-line summary for logs and the terminal.
    pub fn summary(&self) -> String {
        format!(
            "{} added, {} updated, {} skipped, {} failed",
            self.added, self.updated, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_merge_adds_counters_and_widens_window() {
        let t0 = Utc::now();
        let mut a = SyncReport::started(t0);
        a.added = 2;
        a.failed = 1;
        a.finished_at = Some(t0 + Duration::seconds(1));

        let mut b = SyncReport::started(t0 - Duration::seconds(5));
        b.updated = 3;
        b.finished_at = Some(t0 + Duration::seconds(4));

        a.merge(&b);
        assert_eq!(a.processed(), 5);
        assert_eq!(a.started_at, t0 - Duration::seconds(5));
        assert_eq!(a.elapsed_ms(), Some(9000));
        assert!(a.has_failures());
        assert_eq!(a.summary(), "2 added, 3 updated, 0 skipped, 1 failed");
    }
}
