use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serde_json::{json, Map, Value};

use super::airtable::AirtableStore;
use super::base::StoreResult;

pub const STATUS_COLUMN: &str = "Status";
pub const TOTAL_COLUMN: &str = "Total Players";
pub const PROCESSED_COLUMN: &str = "Processed Players";
pub const HISTORY_COLUMN: &str = "History";

/// Single persistent record reflecting the latest run.
#[async_trait]
pub trait RunTracker: Send + Sync {
    async fn run_started(&self, total_eligible: usize) -> StoreResult<()>;
    async fn run_finished(&self, processed: usize) -> StoreResult<()>;
}

pub fn history_line(at: DateTime<Utc>, message: &str) -> String {
    format!("{} - {}", at.format("%Y-%m-%d %H:%M UTC"), message)
}

fn prepend_history(line: &str, previous: Option<&str>) -> String {
    match previous.map(str::trim).filter(|p| !p.is_empty()) {
        Some(previous) => format!("{line}\n{previous}"),
        None => line.to_string(),
    }
}

pub struct AirtableRunTracker {
    store: AirtableStore,
    table_id: String,
    record_id: String,
}

impl AirtableRunTracker {
    pub fn new(store: AirtableStore, table_id: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            store,
            table_id: table_id.into(),
            record_id: record_id.into(),
        }
    }

    async fn update(&self, mut fields: Map<String, Value>, message: &str) -> StoreResult<()> {
        let current = self.store.get_record(&self.table_id, &self.record_id).await?;
        let previous = current.fields.get(HISTORY_COLUMN).and_then(Value::as_str);
        let line = history_line(Utc::now(), message);

        fields.insert(
            HISTORY_COLUMN.to_string(),
            Value::String(prepend_history(&line, previous)),
        );
        debug!("Updating run tracker {}: {}", self.record_id, line);
        self.store
            .update_record(&self.table_id, &self.record_id, fields)
            .await
    }
}

#[async_trait]
impl RunTracker for AirtableRunTracker {
    async fn run_started(&self, total_eligible: usize) -> StoreResult<()> {
        let mut fields = Map::new();
        fields.insert(STATUS_COLUMN.to_string(), json!("Running"));
        fields.insert(TOTAL_COLUMN.to_string(), json!(total_eligible));
        self.update(
            fields,
            &format!("Enrichment started for {total_eligible} players"),
        )
        .await
    }

    async fn run_finished(&self, processed: usize) -> StoreResult<()> {
        let mut fields = Map::new();
        fields.insert(STATUS_COLUMN.to_string(), json!("Complete"));
        fields.insert(PROCESSED_COLUMN.to_string(), json!(processed));
        self.update(
            fields,
            &format!("Enrichment complete, {processed} players processed"),
        )
        .await
    }
}
