pub mod config;
mod enricher;
mod errors;
pub mod reconcile;


pub use config::{AppConfig, ConfigError, EnrichConfig};
pub use enricher::Enricher;
pub use errors::{EnrichError, EnrichResult, FetchError};
pub use reconcile::{reconcile, Reconciliation};
