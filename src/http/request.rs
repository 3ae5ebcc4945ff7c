use std::time::Duration;

pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// How a single navigation should wait for the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigateOptions {
    pub timeout: Duration,
    /// Wait until network activity settles rather than for the first response.
    /// Sessions that do not render pages treat a fully read response as
    /// settled and ignore this.
    pub wait_for_quiescence: bool,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_NAVIGATION_TIMEOUT,
            wait_for_quiescence: true,
        }
    }
}

impl NavigateOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_quiescence(mut self, wait: bool) -> Self {
        self.wait_for_quiescence = wait;
        self
    }
}
