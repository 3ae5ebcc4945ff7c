use crate::core::FetchError;
use crate::http::{NavigateOptions, PageSnapshot};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Opens browsing sessions. Each session is isolated: no cookies, cache or
/// page state is shared with any other session.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn open_session(&self, user_agent: &str) -> Result<Box<dyn BrowsingSession>, FetchError>;
}

#[async_trait]
pub trait BrowsingSession: Send {
    /// Loads `url`. A 404 is reported as [`FetchError::NotFound`]; timeouts and
    /// transport failures leave whatever document state was reached available
    /// through [`BrowsingSession::document`].
    async fn navigate(&mut self, url: &Url, options: NavigateOptions)
        -> Result<PageSnapshot, FetchError>;

    /// Best-effort readiness probe; `false` once `timeout` elapses.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> bool;

    /// Current document, if any navigation got far enough to produce one.
    fn document(&self) -> Option<&PageSnapshot>;

    async fn close(&mut self);
}
