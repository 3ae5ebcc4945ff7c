use anyhow::Context;
use env_logger::Env;
use log::{error, LevelFilter};
use std::process::ExitCode;
use std::sync::Arc;

use player_enricher::notify::{TaskTrackerNotifier, WebhookNotifier};
use player_enricher::storage::AirtableRunTracker;
use player_enricher::{
    AirtableStore, AppConfig, Enricher, HttpBrowser, Notifications, RunEvent, StrategyTable,
};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("selectors", LevelFilter::Warn)
        .filter_module("html5ever", LevelFilter::Error)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_notifications(config: &AppConfig) -> Notifications {
    let mut notifications = Notifications::new();
    if let Some(url) = &config.webhook_url {
        notifications = notifications.with_notifier(Box::new(WebhookNotifier::new(url.clone())));
    }
    if let Some(tracker) = &config.task_tracker {
        notifications = notifications.with_notifier(Box::new(TaskTrackerNotifier::new(
            tracker.endpoint.clone(),
            tracker.token.clone(),
        )));
    }
    notifications
}

fn build_enricher(config: &AppConfig) -> anyhow::Result<Enricher> {
    let strategies = match &config.strategy_file {
        Some(path) => StrategyTable::load(path)
            .with_context(|| format!("loading strategy table {}", path.display()))?,
        None => StrategyTable::default(),
    };

    let store = AirtableStore::new(config.airtable.clone()).context("building Airtable client")?;
    let mut enricher = Enricher::new(
        Arc::new(HttpBrowser::new()),
        Arc::new(store.clone()),
        config.enrich.clone(),
    )
    .with_strategies(strategies);

    if let Some(tracking) = &config.tracking {
        enricher = enricher.with_tracker(Arc::new(AirtableRunTracker::new(
            store,
            &tracking.table_id,
            &tracking.record_id,
        )));
    }
    Ok(enricher)
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("loading configuration")?;
    let notifications = build_notifications(&config);

    let enricher = match build_enricher(&config) {
        Ok(enricher) => enricher,
        Err(e) => {
            notifications
                .send(&RunEvent::Failed {
                    reason: format!("{e:#}"),
                })
                .await;
            return Err(e);
        }
    };

    enricher.with_notifications(notifications).run().await?;
    Ok(())
}
