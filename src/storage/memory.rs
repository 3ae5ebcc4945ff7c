use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use super::base::{RecordStore, StoreError, StoreResult};
use super::types::{BatchUnit, PlayerRecord};

/// In-process record store. Updates are applied back onto the held records so
/// a second run sees the first run's results as stored values.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<PlayerRecord>>>,
    batches: Arc<RwLock<Vec<Vec<BatchUnit>>>>,
    fail_listing: bool,
    fail_updates: bool,
}

impl MemoryStore {
    pub fn new(records: Vec<PlayerRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
            ..Default::default()
        }
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn with_failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn batches(&self) -> Vec<Vec<BatchUnit>> {
        self.batches.read().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.read().iter().map(Vec::len).collect()
    }

    pub fn written(&self) -> Vec<BatchUnit> {
        self.batches.read().iter().flatten().cloned().collect()
    }

    pub fn records(&self) -> Vec<PlayerRecord> {
        self.records.read().clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn eligible_records(&self) -> StoreResult<Vec<PlayerRecord>> {
        if self.fail_listing {
            return Err(StoreError::Operation("listing unavailable".to_string()));
        }
        Ok(self.records.read().clone())
    }

    async fn update_batch(&self, units: &[BatchUnit]) -> StoreResult<()> {
        if self.fail_updates {
            return Err(StoreError::Api {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }

        let mut records = self.records.write();
        for unit in units {
            if let Some(record) = records.iter_mut().find(|r| r.id == unit.record_id) {
                for (field, value) in &unit.fields.values {
                    record.existing.insert(*field, value.clone());
                }
            }
        }
        self.batches.write().push(units.to_vec());
        Ok(())
    }
}
