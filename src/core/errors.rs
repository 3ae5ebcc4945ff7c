use crate::storage::base::StoreError;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("404 - Page not found: {0}")]
    NotFound(Url),

    #[error("Navigation to {url} timed out after {timeout:?}")]
    Timeout { url: Url, timeout: Duration },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: Url, reason: String },

    #[error("Browser session error: {0}")]
    Session(String),
}

impl FetchError {
    /// Soft failures leave the record processable against whatever loaded.
    pub fn is_soft(&self) -> bool {
        matches!(self, FetchError::Timeout { .. } | FetchError::Navigation { .. })
    }
}

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Fetch error: {0}")]
    FetchError(#[from] FetchError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StoreError),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Record {0} has no profile link")]
    MissingProfileLink(String),

    #[error("Notification error: {0}")]
    NotificationError(String),
}

impl EnrichError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EnrichError::FetchError(FetchError::NotFound(_)))
    }
}

pub type EnrichResult<T> = Result<T, EnrichError>;
