use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::http::DEFAULT_NAVIGATION_TIMEOUT;
use crate::scrapers::http_scraper::DEFAULT_USER_AGENT;
use crate::storage::airtable::{AirtableConfig, DEFAULT_API_URL};

pub const DEFAULT_LINK_FIELD: &str = "URL ESPN Link";
pub const DEFAULT_VIEW_ID: &str = "viwExtQmSJeSQR48C";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(String),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: String, reason: String },

    #[error("Failed to read strategy file {path}: {source}")]
    StrategyFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid strategy table: {0}")]
    StrategyTable(#[from] serde_json::Error),
}

/// Knobs of the enrichment pipeline itself.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub batch_size: usize,
    pub record_delay: Duration,
    pub navigation_timeout: Duration,
    pub selector_timeout: Duration,
    pub ready_selector: String,
    pub user_agent: String,
    /// Path segment of a profile URL and its replacement for the bio page.
    pub bio_path: (String, String),
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            record_delay: Duration::from_secs(2),
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            selector_timeout: Duration::from_secs(10),
            ready_selector: ".PlayerHeader__Bio".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            bio_path: ("/player/_/".to_string(), "/player/bio/_/".to_string()),
        }
    }
}

impl EnrichConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_record_delay(mut self, delay: Duration) -> Self {
        self.record_delay = delay;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_selector_timeout(mut self, timeout: Duration) -> Self {
        self.selector_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_ready_selector(mut self, selector: &str) -> Self {
        self.ready_selector = selector.to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub struct TaskTrackerConfig {
    pub endpoint: Url,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TrackingConfig {
    pub table_id: String,
    pub record_id: String,
}

/// Everything the binary needs, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub airtable: AirtableConfig,
    pub enrich: EnrichConfig,
    pub strategy_file: Option<PathBuf>,
    pub webhook_url: Option<Url>,
    pub task_tracker: Option<TaskTrackerConfig>,
    pub tracking: Option<TrackingConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables, reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::Missing(key.to_string()));

        let mut api_url = get("AIRTABLE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !api_url.ends_with('/') {
            api_url.push('/');
        }

        let airtable = AirtableConfig {
            api_url: parse_url("AIRTABLE_API_URL", &api_url)?,
            token: require("AIRTABLE_TOKEN")?,
            base_id: require("AIRTABLE_BASE_ID")?,
            table_id: require("AIRTABLE_PLAYERS_TABLE_ID")?,
            view: Some(get("AIRTABLE_VIEW_ID").unwrap_or_else(|| DEFAULT_VIEW_ID.to_string())),
            link_field: get("PROFILE_LINK_FIELD").unwrap_or_else(|| DEFAULT_LINK_FIELD.to_string()),
        };

        let defaults = EnrichConfig::default();
        let mut enrich = EnrichConfig {
            user_agent: get("USER_AGENT").unwrap_or(defaults.user_agent.clone()),
            ..defaults
        };
        if let Some(size) = get("BATCH_SIZE") {
            enrich.batch_size = parse_number("BATCH_SIZE", &size)?;
        }
        if let Some(ms) = get("RECORD_DELAY_MS") {
            enrich.record_delay = Duration::from_millis(parse_number("RECORD_DELAY_MS", &ms)?);
        }
        if let Some(secs) = get("NAVIGATION_TIMEOUT_SECS") {
            enrich.navigation_timeout =
                Duration::from_secs(parse_number("NAVIGATION_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = get("SELECTOR_TIMEOUT_SECS") {
            enrich.selector_timeout =
                Duration::from_secs(parse_number("SELECTOR_TIMEOUT_SECS", &secs)?);
        }

        let webhook_url = get("WEBHOOK_URL")
            .map(|url| parse_url("WEBHOOK_URL", &url))
            .transpose()?;

        let task_tracker = get("TASK_TRACKER_URL")
            .map(|url| {
                Ok::<_, ConfigError>(TaskTrackerConfig {
                    endpoint: parse_url("TASK_TRACKER_URL", &url)?,
                    token: get("TASK_TRACKER_TOKEN"),
                })
            })
            .transpose()?;

        let tracking = match (get("TRACKING_TABLE_ID"), get("TRACKING_RECORD_ID")) {
            (Some(table_id), Some(record_id)) => Some(TrackingConfig {
                table_id,
                record_id,
            }),
            _ => None,
        };

        Ok(Self {
            airtable,
            enrich,
            strategy_file: get("STRATEGY_FILE").map(PathBuf::from),
            webhook_url,
            task_tracker,
            tracking,
        })
    }
}

fn parse_url(var: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::Invalid {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

fn parse_number<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("AIRTABLE_TOKEN", "pat123"),
        ("AIRTABLE_BASE_ID", "appBase"),
        ("AIRTABLE_PLAYERS_TABLE_ID", "tblPlayers"),
    ];

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.airtable.api_url.as_str(), DEFAULT_API_URL);
        assert_eq!(config.airtable.link_field, DEFAULT_LINK_FIELD);
        assert_eq!(config.airtable.view.as_deref(), Some(DEFAULT_VIEW_ID));
        assert_eq!(config.enrich.batch_size, 10);
        assert_eq!(config.enrich.record_delay, Duration::from_secs(2));
        assert_eq!(config.enrich.navigation_timeout, Duration::from_secs(30));
        assert!(config.webhook_url.is_none());
        assert!(config.task_tracker.is_none());
        assert!(config.tracking.is_none());
    }

    #[test]
    fn test_missing_token() {
        let result = AppConfig::from_lookup(lookup(&REQUIRED[1..]));
        match result {
            Err(ConfigError::Missing(var)) => assert_eq!(var, "AIRTABLE_TOKEN"),
            other => panic!("expected missing token, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("AIRTABLE_API_URL", "http://localhost:9000/v0"),
            ("BATCH_SIZE", "5"),
            ("RECORD_DELAY_MS", "250"),
            ("WEBHOOK_URL", "https://hooks.example.com/T000"),
            ("TRACKING_TABLE_ID", "tblRuns"),
            ("TRACKING_RECORD_ID", "recRun"),
        ]);
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.airtable.api_url.as_str(), "http://localhost:9000/v0/");
        assert_eq!(config.enrich.batch_size, 5);
        assert_eq!(config.enrich.record_delay, Duration::from_millis(250));
        assert!(config.webhook_url.is_some());
        assert_eq!(config.tracking.unwrap().record_id, "recRun");
    }

    #[test]
    fn test_invalid_number() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("BATCH_SIZE", "ten"));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&pairs)),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
