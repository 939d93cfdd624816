//! Alert monitor - entry point.
//!
//! Console consumer of the latest-decision endpoint: polls, deduplicates
//! by content fingerprint, and prints each new alert with a running
//! history count. Shows a waiting line until the first decision lands.

use std::time::Duration;

use anyhow::Result;
use fraud_fusion_pipeline::{config::AppConfig, consumer::FeedUpdate, AlertFeed};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fraud_fusion_pipeline=info".parse()?)
                .add_directive("fusion_monitor=info".parse()?),
        )
        .init();

    let config = AppConfig::load()?;
    let settings = &config.monitor;
    info!(
        latest_url = %settings.latest_url,
        poll_interval_secs = settings.poll_interval_secs,
        "Monitor started"
    );

    let mut feed = AlertFeed::new(&settings.latest_url, Duration::from_secs(5));
    let interval = Duration::from_secs(settings.poll_interval_secs);
    let mut was_waiting = false;

    loop {
        match feed.poll_once().await {
            FeedUpdate::NewAlert => {
                was_waiting = false;
                if let Some(record) = feed.history().latest() {
                    let d = &record.decision;
                    println!("==============================");
                    println!("ALERT {}  ({})", record.record_id, record.observed_at.format("%Y-%m-%d %H:%M:%S"));
                    println!("  fraud_probability: {}", d.fraud_probability);
                    println!("  decision:          {:?}", d.decision);
                    println!("  transaction_risk:  {}  (amount {})", d.transaction_risk, d.amount);
                    println!(
                        "  communication_risk: {}  (urgency {}, sentiment {}, manipulative {})",
                        d.communication_risk, d.urgency_score, d.sentiment_score, d.is_manipulative
                    );
                    println!("  history size:      {}", feed.history().len());
                    println!("==============================");
                }
            }
            FeedUpdate::Unchanged => {
                was_waiting = false;
            }
            FeedUpdate::Waiting => {
                // Print the waiting state once per quiet stretch.
                if !was_waiting {
                    println!("Waiting for alerts...");
                    was_waiting = true;
                }
            }
        }

        tokio::time::sleep(interval).await;
    }
}
