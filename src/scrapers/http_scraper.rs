use async_trait::async_trait;
use log::{debug, trace};
use reqwest::{header, Client, ClientBuilder, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

use super::{Browser, BrowsingSession};
use crate::core::FetchError;
use crate::http::{NavigateOptions, PageSnapshot};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Browser backed by plain HTTP requests. Pages are taken as served, without
/// script execution, so a completed response is already quiescent.
#[derive(Clone, Default)]
pub struct HttpBrowser;

impl HttpBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_client(&self, user_agent: &str) -> Result<Client, FetchError> {
        let mut header_map = header::HeaderMap::new();
        header_map.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        header_map.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.9"),
        );

        ClientBuilder::new()
            .user_agent(user_agent)
            .default_headers(header_map)
            .build()
            .map_err(|e| FetchError::Session(e.to_string()))
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn open_session(&self, user_agent: &str) -> Result<Box<dyn BrowsingSession>, FetchError> {
        let client = self.build_client(user_agent)?;
        Ok(Box::new(HttpSession {
            client: Some(client),
            current: None,
        }))
    }
}

pub struct HttpSession {
    client: Option<Client>,
    current: Option<PageSnapshot>,
}

impl HttpSession {
    fn classify(url: &Url, timeout: Duration, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.clone(),
                timeout,
            }
        } else {
            FetchError::Navigation {
                url: url.clone(),
                reason: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl BrowsingSession for HttpSession {
    async fn navigate(
        &mut self,
        url: &Url,
        options: NavigateOptions,
    ) -> Result<PageSnapshot, FetchError> {
        self.current = None;
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| FetchError::Session("session already closed".to_string()))?;

        // No scripts run here, so the read body is already settled and
        // `wait_for_quiescence` has no effect.
        let response = client
            .get(url.clone())
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| Self::classify(url, options.timeout, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.clone()));
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(url, options.timeout, e))?;
        debug!(
            "Loaded {} (status={}, body_length={})",
            final_url,
            status.as_u16(),
            body.len()
        );
        trace!("Page body: {}", body);

        let snapshot = PageSnapshot::new(final_url, status.as_u16(), body);
        self.current = Some(snapshot.clone());
        Ok(snapshot)
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> bool {
        let Some(page) = &self.current else {
            return false;
        };
        let Ok(selector) = Selector::parse(selector) else {
            return false;
        };
        Html::parse_document(&page.body)
            .select(&selector)
            .next()
            .is_some()
    }

    fn document(&self) -> Option<&PageSnapshot> {
        self.current.as_ref()
    }

    async fn close(&mut self) {
        self.current = None;
        self.client = None;
    }
}
