use log::{debug, info, warn};
use std::sync::Arc;
use url::Url;

use super::{Browser, BrowsingSession};
use crate::core::{EnrichConfig, FetchError};
use crate::http::{NavigateOptions, PageSnapshot, PlayerPages};

/// Loads the profile and bio pages of one player inside a single session that
/// is closed before returning, whatever the outcome.
pub struct PageFetcher {
    browser: Arc<dyn Browser>,
    config: EnrichConfig,
}

impl PageFetcher {
    pub fn new(browser: Arc<dyn Browser>, config: EnrichConfig) -> Self {
        Self { browser, config }
    }

    /// Bio page URL derived from a profile URL, if the profile URL has the
    /// expected shape.
    pub fn bio_url(&self, profile_url: &Url) -> Option<Url> {
        let (from, to) = &self.config.bio_path;
        if !profile_url.path().contains(from.as_str()) {
            return None;
        }
        Url::parse(&profile_url.as_str().replacen(from.as_str(), to, 1)).ok()
    }

    pub async fn fetch(&self, profile_url: &Url) -> Result<PlayerPages, FetchError> {
        let mut session = self.browser.open_session(&self.config.user_agent).await?;
        let result = self.fetch_with(session.as_mut(), profile_url).await;
        session.close().await;
        result
    }

    async fn fetch_with(
        &self,
        session: &mut dyn BrowsingSession,
        profile_url: &Url,
    ) -> Result<PlayerPages, FetchError> {
        let options = NavigateOptions::default().with_timeout(self.config.navigation_timeout);

        info!("Navigating to: {}", profile_url);
        let profile = self.navigate(session, profile_url, options).await?;

        if profile.is_some()
            && !session
                .wait_for_selector(&self.config.ready_selector, self.config.selector_timeout)
                .await
        {
            warn!(
                "{} not found on {}, relying on alternative selectors",
                self.config.ready_selector, profile_url
            );
        }

        let bio = match self.bio_url(profile_url) {
            Some(bio_url) => {
                debug!("Navigating to bio page: {}", bio_url);
                match self.navigate(session, &bio_url, options).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!("Bio page unavailable, career fields skipped: {}", e);
                        None
                    }
                }
            }
            None => {
                debug!("No bio page derivable from {}", profile_url);
                None
            }
        };

        Ok(PlayerPages { profile, bio })
    }

    /// Soft failures fall back to whatever document state the session holds.
    async fn navigate(
        &self,
        session: &mut dyn BrowsingSession,
        url: &Url,
        options: NavigateOptions,
    ) -> Result<Option<PageSnapshot>, FetchError> {
        match session.navigate(url, options).await {
            Ok(page) => Ok(Some(page)),
            Err(e) if e.is_soft() => {
                warn!("{}, continuing with partial page", e);
                Ok(session.document().cloned())
            }
            Err(e) => Err(e),
        }
    }
}
