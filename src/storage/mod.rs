pub mod airtable;
pub mod base;
pub mod manager;
pub mod memory;
pub mod tracker;
pub mod types;

pub use airtable::{AirtableConfig, AirtableStore};
pub use base::{RecordStore, StoreError, StoreResult};
pub use manager::BatchWriter;
pub use memory::MemoryStore;
pub use tracker::{AirtableRunTracker, RunTracker};
pub use types::{BatchUnit, DataStatus, EnrichedFields, FieldValues, PlayerField, PlayerRecord};
