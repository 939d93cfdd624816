//! Mailbox ingestion watcher - entry point.
//!
//! Polls the mailbox collaborator for unread messages and feeds each one
//! through the serving pipeline. Runs until externally terminated.

use std::time::Duration;

use anyhow::Result;
use fraud_fusion_pipeline::{
    config::AppConfig,
    watcher::{HttpScoringClient, RestMailbox, SyntheticTransactions, Watcher, WatcherConfig},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fraud_fusion_pipeline=info".parse()?)
                .add_directive("fusion_watcher=info".parse()?),
        )
        .init();

    info!("Starting mailbox watcher");

    let config = AppConfig::load()?;
    let settings = &config.watcher;
    info!(
        api_url = %settings.api_url,
        mailbox_url = %settings.mailbox_url,
        poll_interval_secs = settings.poll_interval_secs,
        "Watcher configuration loaded"
    );

    let timeout = Duration::from_secs(settings.request_timeout_secs);
    let source = RestMailbox::new(
        &settings.mailbox_url,
        std::env::var("MAILBOX_TOKEN").ok(),
        timeout,
    );
    let client = HttpScoringClient::new(&settings.api_url, timeout);
    let transactions = SyntheticTransactions::new();

    let watcher = Watcher::new(
        source,
        client,
        transactions,
        WatcherConfig {
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            max_messages: settings.max_messages,
        },
    );

    watcher.run().await;

    Ok(())
}
