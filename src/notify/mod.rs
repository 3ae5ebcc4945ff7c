use async_trait::async_trait;
use futures::future::join_all;
use log::{error, info};
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::core::{EnrichError, EnrichResult};
use crate::stats::RunStats;

#[derive(Debug, Clone)]
pub enum RunEvent {
    Started { total_eligible: usize },
    Completed(RunStats),
    Failed { reason: String },
}

impl RunEvent {
    pub fn message(&self) -> String {
        match self {
            RunEvent::Started { total_eligible } => {
                format!("ESPN enrichment started for {total_eligible} players")
            }
            RunEvent::Completed(stats) => format!(
                "ESPN enrichment complete: {} processed, {} skipped, {} written, {} failed batches",
                stats.processed, stats.skipped, stats.records_written, stats.batch_failures
            ),
            RunEvent::Failed { reason } => format!("ESPN enrichment failed: {reason}"),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    async fn notify(&self, event: &RunEvent) -> EnrichResult<()>;
}

async fn post_json<T: Serialize + Sync>(
    client: &Client,
    endpoint: &Url,
    token: Option<&str>,
    payload: &T,
) -> EnrichResult<()> {
    let mut request = client.post(endpoint.clone()).json(payload);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(EnrichError::NotificationError(format!(
            "{endpoint} returned {status}: {body}"
        )));
    }
    Ok(())
}

/// Chat webhook receiving `{"text": ...}` for every run event.
pub struct WebhookNotifier {
    client: Client,
    endpoint: Url,
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

impl WebhookNotifier {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, event: &RunEvent) -> EnrichResult<()> {
        let text = event.message();
        post_json(&self.client, &self.endpoint, None, &WebhookMessage { text: &text }).await
    }
}

/// Opens a task for fatal failures only.
pub struct TaskTrackerNotifier {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

#[derive(Serialize)]
struct TrackerTask<'a> {
    name: &'a str,
    description: &'a str,
}

impl TaskTrackerNotifier {
    pub fn new(endpoint: Url, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            token,
        }
    }
}

#[async_trait]
impl Notifier for TaskTrackerNotifier {
    fn name(&self) -> &str {
        "task tracker"
    }

    async fn notify(&self, event: &RunEvent) -> EnrichResult<()> {
        let RunEvent::Failed { reason } = event else {
            return Ok(());
        };
        let task = TrackerTask {
            name: "ESPN enrichment failed",
            description: reason,
        };
        post_json(&self.client, &self.endpoint, self.token.as_deref(), &task).await
    }
}

/// Fans an event out to every notifier. Failures are logged and dropped.
#[derive(Default)]
pub struct Notifications {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub async fn send(&self, event: &RunEvent) {
        if self.notifiers.is_empty() {
            return;
        }
        let results = join_all(self.notifiers.iter().map(|n| n.notify(event))).await;
        for (notifier, result) in self.notifiers.iter().zip(results) {
            match result {
                Ok(()) => info!("Sent {} notification", notifier.name()),
                Err(e) => error!("Failed to send {} notification: {}", notifier.name(), e),
            }
        }
    }
}
