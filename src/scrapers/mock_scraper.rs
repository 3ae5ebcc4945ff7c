use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

use super::{Browser, BrowsingSession};
use crate::core::FetchError;
use crate::http::{NavigateOptions, PageSnapshot};

#[derive(Clone, Debug)]
pub enum MockPage {
    Loaded { status: u16, body: String },
    /// Navigation times out; `partial` is the document state reached, if any.
    TimedOut { partial: Option<String> },
    Failed(String),
}

impl MockPage {
    pub fn html(body: impl Into<String>) -> Self {
        MockPage::Loaded {
            status: 200,
            body: body.into(),
        }
    }
}

/// Scripted browser keyed by URL. Unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct MockBrowser {
    pages: Arc<RwLock<HashMap<String, MockPage>>>,
    visited: Arc<RwLock<Vec<Url>>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    delay: Option<Duration>,
    fail_open: bool,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, page: MockPage) -> Self {
        self.pages.write().insert(url.to_string(), page);
        self
    }

    /// Settle time spent by navigations that wait for quiescence.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_failing_sessions(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn visited(&self) -> Vec<Url> {
        self.visited.read().clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn open_session(&self, _user_agent: &str) -> Result<Box<dyn BrowsingSession>, FetchError> {
        if self.fail_open {
            return Err(FetchError::Session("browser failed to launch".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            browser: self.clone(),
            current: None,
            closed: false,
        }))
    }
}

pub struct MockSession {
    browser: MockBrowser,
    current: Option<PageSnapshot>,
    closed: bool,
}

#[async_trait]
impl BrowsingSession for MockSession {
    async fn navigate(
        &mut self,
        url: &Url,
        options: NavigateOptions,
    ) -> Result<PageSnapshot, FetchError> {
        self.current = None;
        if let Some(delay) = self.browser.delay.filter(|_| options.wait_for_quiescence) {
            sleep(delay).await;
        }
        self.browser.visited.write().push(url.clone());

        let page = self.browser.pages.read().get(url.as_str()).cloned();
        match page {
            Some(MockPage::Loaded { status: 404, .. }) | None => {
                Err(FetchError::NotFound(url.clone()))
            }
            Some(MockPage::Loaded { status, body }) => {
                let snapshot = PageSnapshot::new(url.clone(), status, body);
                self.current = Some(snapshot.clone());
                Ok(snapshot)
            }
            Some(MockPage::TimedOut { partial }) => {
                self.current = partial.map(|body| PageSnapshot::new(url.clone(), 200, body));
                Err(FetchError::Timeout {
                    url: url.clone(),
                    timeout: options.timeout,
                })
            }
            Some(MockPage::Failed(reason)) => Err(FetchError::Navigation {
                url: url.clone(),
                reason,
            }),
        }
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> bool {
        self.current
            .as_ref()
            .map(|page| page.body.contains(selector.trim_start_matches('.')))
            .unwrap_or(false)
    }

    fn document(&self) -> Option<&PageSnapshot> {
        self.current.as_ref()
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.current = None;
            self.browser.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const PAGE: &str = "https://www.espn.com.au/nba/player/_/id/1/a";

    #[tokio::test]
    async fn test_quiescence_wait_is_optional() {
        let browser = MockBrowser::new()
            .with_page(PAGE, MockPage::html("<p>ok</p>"))
            .with_delay(Duration::from_secs(3600));
        let mut session = browser.open_session("test").await.unwrap();
        let url = Url::parse(PAGE).unwrap();

        let eager = timeout(
            Duration::from_secs(5),
            session.navigate(&url, NavigateOptions::default().with_quiescence(false)),
        )
        .await;
        assert!(eager.unwrap().is_ok());

        let settled = timeout(
            Duration::from_millis(50),
            session.navigate(&url, NavigateOptions::default()),
        )
        .await;
        assert!(settled.is_err());
    }

    #[tokio::test]
    async fn test_close_is_counted_once() {
        let browser = MockBrowser::new();
        let mut session = browser.open_session("test").await.unwrap();
        session.close().await;
        session.close().await;

        assert_eq!(browser.sessions_opened(), 1);
        assert_eq!(browser.sessions_closed(), 1);
    }
}
