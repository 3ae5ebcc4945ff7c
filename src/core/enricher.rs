use chrono::{NaiveDate, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::time::sleep;
use url::Url;

use super::config::EnrichConfig;
use super::reconcile::{reconcile, Reconciliation};
use super::{EnrichError, EnrichResult};
use crate::notify::{Notifications, RunEvent};
use crate::parser::{extract_all, normalize_all, StrategyTable};
use crate::scrapers::{Browser, PageFetcher};
use crate::stats::{RunStats, StatsTracker};
use crate::storage::types::{BatchUnit, DataStatus, EnrichedFields, FieldValues, PlayerRecord};
use crate::storage::{BatchWriter, RecordStore, RunTracker};

/// Drives every eligible record through fetch, extract, normalize and
/// reconcile, one record at a time, and writes results back in batches.
pub struct Enricher {
    fetcher: PageFetcher,
    store: Arc<dyn RecordStore>,
    strategies: StrategyTable,
    config: EnrichConfig,
    tracker: Option<Arc<dyn RunTracker>>,
    notifications: Notifications,
}

impl Enricher {
    pub fn new(browser: Arc<dyn Browser>, store: Arc<dyn RecordStore>, config: EnrichConfig) -> Self {
        info!("Initializing enricher");
        Self {
            fetcher: PageFetcher::new(browser, config.clone()),
            store,
            strategies: StrategyTable::default(),
            config,
            tracker: None,
            notifications: Notifications::new(),
        }
    }

    pub fn with_strategies(mut self, strategies: StrategyTable) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn RunTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn with_notifications(mut self, notifications: Notifications) -> Self {
        self.notifications = notifications;
        self
    }

    /// Runs one full pass. Only enumeration failures are fatal; every
    /// per-record failure ends up in that record's status instead.
    /// Each call starts from fresh statistics under a new run id.
    pub async fn run(&self) -> EnrichResult<RunStats> {
        let stats = StatsTracker::new();
        match self.run_inner(&stats).await {
            Ok(stats) => Ok(stats),
            Err(e) => {
                error!("Enrichment run failed: {}", e);
                stats.finish();
                self.notifications
                    .send(&RunEvent::Failed {
                        reason: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn run_inner(&self, stats: &StatsTracker) -> EnrichResult<RunStats> {
        info!("Starting enrichment run {}", stats.run_id());

        let records = self.store.eligible_records().await?;
        let eligible: Vec<PlayerRecord> = records
            .into_iter()
            .filter(|record| {
                if record.profile_link().is_some() {
                    return true;
                }
                info!("Skipping {} ({}): no profile link", record.display_name(), record.id);
                stats.record_skipped();
                false
            })
            .collect();

        let total = eligible.len();
        info!("Found {} players to enrich", total);
        stats.record_eligible(total);

        if let Some(tracker) = &self.tracker {
            if let Err(e) = tracker.run_started(total).await {
                warn!("Failed to update run tracker: {}", e);
            }
        }
        self.notifications
            .send(&RunEvent::Started {
                total_eligible: total,
            })
            .await;

        let mut writer = BatchWriter::new(Arc::clone(&self.store), self.config.batch_size);

        for (index, record) in eligible.iter().enumerate() {
            let position = index + 1;
            let is_last = position == total;
            info!(
                "[{}/{}] ({:.1}%) Processing {}",
                position,
                total,
                position as f64 * 100.0 / total as f64,
                record.display_name()
            );

            let fields = self.process_record(record, Utc::now().date_naive()).await;
            stats.record_outcome(fields.data_status);
            writer.push(BatchUnit::new(record.id.clone(), fields));

            if writer.is_full() || is_last {
                self.flush(&mut writer, stats).await;
            }

            if !is_last && !self.config.record_delay.is_zero() {
                debug!("Waiting {:?} before next player", self.config.record_delay);
                sleep(self.config.record_delay).await;
            }
        }

        let processed = stats.get_stats().processed;
        if let Some(tracker) = &self.tracker {
            if let Err(e) = tracker.run_finished(processed).await {
                warn!("Failed to update run tracker: {}", e);
            }
        }

        info!("Enrichment complete. Players processed: {}", processed);
        stats.finish();
        stats.print_summary();

        let summary = stats.get_stats();
        self.notifications
            .send(&RunEvent::Completed(summary.clone()))
            .await;
        Ok(summary)
    }

    async fn flush(&self, writer: &mut BatchWriter, stats: &StatsTracker) {
        let pending = writer.len();
        match writer.flush().await {
            Ok(written) => stats.record_flush(written),
            Err(e) => {
                error!("Failed to write batch of {} records: {}", pending, e);
                stats.record_flush_failure();
            }
        }
    }

    /// Result for one record. Never fails: errors become the record's status.
    pub async fn process_record(&self, record: &PlayerRecord, today: NaiveDate) -> EnrichedFields {
        match self.enrich_record(record).await {
            Ok((values, reconciliation)) => {
                info!(
                    "{}: {} ({})",
                    record.display_name(),
                    reconciliation.status,
                    reconciliation.summary
                );
                EnrichedFields::enriched(values, reconciliation, today)
            }
            Err(e) if e.is_not_found() => {
                warn!("{}: {}", record.display_name(), e);
                EnrichedFields::failed(DataStatus::NotFound, e.to_string(), today)
            }
            Err(e) => {
                error!("Error processing {}: {}", record.display_name(), e);
                EnrichedFields::failed(DataStatus::Error, e.to_string(), today)
            }
        }
    }

    async fn enrich_record(&self, record: &PlayerRecord) -> EnrichResult<(FieldValues, Reconciliation)> {
        let link = record
            .profile_link()
            .ok_or_else(|| EnrichError::MissingProfileLink(record.id.clone()))?;
        let url = Url::parse(link)?;

        let pages = self.fetcher.fetch(&url).await?;
        let extracted = extract_all(&self.strategies, &pages);
        let values = normalize_all(&extracted);
        debug!("Extracted {} data points for {}", values.len(), record.display_name());

        let reconciliation = reconcile(&values, &record.existing);
        Ok((values, reconciliation))
    }
}
