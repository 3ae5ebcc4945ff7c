use async_trait::async_trait;
use thiserror::Error;

use super::types::{BatchUnit, PlayerRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode store response: {0}")]
    Decode(String),

    #[error("Store operation failed: {0}")]
    Operation(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The hosted table holding player records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records whose profile link is set, in the order the store returns them.
    async fn eligible_records(&self) -> StoreResult<Vec<PlayerRecord>>;

    /// Writes up to `max_batch_size` units in a single call.
    async fn update_batch(&self, units: &[BatchUnit]) -> StoreResult<()>;

    fn max_batch_size(&self) -> usize {
        10
    }
}
