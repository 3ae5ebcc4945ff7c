pub mod core;
pub mod http;
pub mod notify;
pub mod parser;
pub mod scrapers;
pub mod stats;
pub mod storage;

pub use core::{AppConfig, EnrichConfig, EnrichError, EnrichResult, Enricher, FetchError};
pub use notify::{Notifications, Notifier, RunEvent};
pub use parser::StrategyTable;
pub use scrapers::{Browser, HttpBrowser};
pub use stats::{RunStats, StatsTracker};
pub use storage::{AirtableStore, RecordStore};
