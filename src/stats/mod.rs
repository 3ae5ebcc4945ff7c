use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::storage::types::DataStatus;

#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub run_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_eligible: usize,
    pub processed: usize,
    pub skipped: usize,
    pub statuses: BTreeMap<String, usize>,
    pub batches_flushed: usize,
    pub batch_failures: usize,
    pub records_written: usize,
}

impl RunStats {
    pub fn count(&self, status: DataStatus) -> usize {
        self.statuses.get(status.as_str()).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Arc<RwLock<RunStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(RunStats {
                run_id: Uuid::now_v7(),
                start_time: Utc::now(),
                end_time: None,
                total_eligible: 0,
                processed: 0,
                skipped: 0,
                statuses: BTreeMap::new(),
                batches_flushed: 0,
                batch_failures: 0,
                records_written: 0,
            })),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.stats.read().run_id
    }

    pub fn record_eligible(&self, total: usize) {
        self.stats.write().total_eligible = total;
    }

    pub fn record_skipped(&self) {
        self.stats.write().skipped += 1;
    }

    pub fn record_outcome(&self, status: DataStatus) {
        let mut stats = self.stats.write();
        stats.processed += 1;
        *stats.statuses.entry(status.as_str().to_string()).or_insert(0) += 1;
    }

    pub fn record_flush(&self, written: usize) {
        let mut stats = self.stats.write();
        stats.batches_flushed += 1;
        stats.records_written += written;
    }

    pub fn record_flush_failure(&self) {
        self.stats.write().batch_failures += 1;
    }

    pub fn finish(&self) {
        self.stats.write().end_time = Some(Utc::now());
    }

    pub fn get_stats(&self) -> RunStats {
        self.stats.read().clone()
    }

    pub fn print_summary(&self) {
        let stats = self.stats.read();
        let duration = stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time);

        println!("\nEnrichment Statistics:");
        println!("======================");
        println!("Run: {}", stats.run_id);
        println!("Duration: {} seconds", duration.num_seconds());
        println!("Eligible Players: {}", stats.total_eligible);
        println!("Processed Players: {}", stats.processed);
        println!("Skipped Players: {}", stats.skipped);
        println!("Batches Flushed: {}", stats.batches_flushed);
        println!("Batch Failures: {}", stats.batch_failures);
        println!("Records Written: {}", stats.records_written);

        println!("\nData Status:");
        for (status, count) in &stats.statuses {
            println!("  {}: {}", status, count);
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_and_flushes() {
        let tracker = StatsTracker::new();
        tracker.record_eligible(3);
        tracker.record_outcome(DataStatus::Updated);
        tracker.record_outcome(DataStatus::Updated);
        tracker.record_outcome(DataStatus::NotFound);
        tracker.record_flush(3);
        tracker.record_flush_failure();
        tracker.finish();

        let stats = tracker.get_stats();
        assert_eq!(stats.processed, 3);
        assert_eq!(stats.count(DataStatus::Updated), 2);
        assert_eq!(stats.count(DataStatus::NotFound), 1);
        assert_eq!(stats.count(DataStatus::Error), 0);
        assert_eq!(stats.records_written, 3);
        assert_eq!(stats.batch_failures, 1);
        assert!(stats.end_time.is_some());
    }

    #[test]
    fn test_clones_share_state() {
        let tracker = StatsTracker::new();
        let clone = tracker.clone();
        clone.record_skipped();
        assert_eq!(tracker.get_stats().skipped, 1);
        assert_eq!(tracker.run_id(), clone.run_id());
    }
}
