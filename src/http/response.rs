use chrono::{DateTime, Utc};
use url::Url;

/// Document state reached by a navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub url: Url,
    pub status: u16,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl PageSnapshot {
    pub fn new(url: Url, status: u16, body: impl Into<String>) -> Self {
        Self {
            url,
            status,
            body: body.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Snapshots gathered for one player. Either page may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerPages {
    pub profile: Option<PageSnapshot>,
    pub bio: Option<PageSnapshot>,
}
