use super::base::{RecordStore, StoreResult};
use super::types::BatchUnit;
use log::{debug, info};
use std::sync::Arc;

/// Queues per-record results and writes them to the store in fixed-size groups.
pub struct BatchWriter {
    store: Arc<dyn RecordStore>,
    batch_size: usize,
    queue: Vec<BatchUnit>,
}

impl BatchWriter {
    pub fn new(store: Arc<dyn RecordStore>, batch_size: usize) -> Self {
        let batch_size = batch_size.clamp(1, store.max_batch_size().max(1));
        Self {
            store,
            batch_size,
            queue: Vec::with_capacity(batch_size),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn push(&mut self, unit: BatchUnit) {
        debug!(
            "Queued {} ({}), {} pending",
            unit.record_id,
            unit.fields.data_status,
            self.queue.len() + 1
        );
        self.queue.push(unit);
    }

    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.batch_size
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Writes everything queued. The queue is cleared whether or not the write
    /// succeeds; failed units are not replayed.
    pub async fn flush(&mut self) -> StoreResult<usize> {
        if self.queue.is_empty() {
            return Ok(0);
        }

        let units = std::mem::take(&mut self.queue);
        self.store.update_batch(&units).await?;
        info!("Updated batch of {} records", units.len());
        Ok(units.len())
    }
}
