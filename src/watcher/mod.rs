//! Mailbox ingestion watcher.
//!
//! Polls the external source on a fixed interval, extracts features from
//! each new message, pairs them with transaction features, and submits the
//! pair to the serving endpoint. Delivery is at-least-once: an event is
//! marked consumed only after the pipeline accepted it, so a crash between
//! those two steps can replay the event on the next run. Within one
//! process the seen-set makes delivery effectively once.

pub mod mailbox;
pub mod scoring;
pub mod synth;

pub use mailbox::{MailMessage, MailboxSource, RestMailbox};
pub use scoring::{HttpScoringClient, ScoringClient};
pub use synth::{SyntheticTransactions, TransactionProvider};

use std::collections::HashSet;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::feature_extractor::FeatureExtractor;

/// Watcher loop parameters.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Sleep between polling cycles.
    pub poll_interval: Duration,
    /// Upper bound on unread messages pulled per cycle.
    pub max_messages: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            max_messages: 10,
        }
    }
}

/// Outcome of handling one mailbox event. The outcome, not control flow,
/// drives the mark-consumed decision: `Processed` and `Skipped` events are
/// marked, `Failed` events are left unread for the next cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Pipeline accepted the event pair.
    Processed,
    /// Nothing to do for this event (already processed earlier).
    Skipped(String),
    /// Fetch or submission failed; retried next cycle.
    Failed(String),
}

/// Sequential ingestion loop: one event in flight at a time.
pub struct Watcher<S, C, T> {
    source: S,
    client: C,
    transactions: T,
    extractor: FeatureExtractor,
    seen: HashSet<String>,
    config: WatcherConfig,
}

impl<S, C, T> Watcher<S, C, T>
where
    S: MailboxSource,
    C: ScoringClient,
    T: TransactionProvider,
{
    pub fn new(source: S, client: C, transactions: T, config: WatcherConfig) -> Self {
        Self {
            source,
            client,
            transactions,
            extractor: FeatureExtractor::new(),
            seen: HashSet::new(),
            config,
        }
    }

    /// Run forever. The only exit is external process termination; a
    /// failed cycle is logged and retried after the normal sleep.
    pub async fn run(mut self) {
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            max_messages = self.config.max_messages,
            "Watcher started"
        );

        loop {
            self.run_cycle().await;
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// One polling cycle. A failed poll is treated as an empty result;
    /// per-event outcomes decide which events get marked consumed.
    pub async fn run_cycle(&mut self) -> Vec<(String, EventOutcome)> {
        let ids = match self.source.list_unread(self.config.max_messages).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "Poll failed; treating as empty cycle");
                return Vec::new();
            }
        };

        if ids.is_empty() {
            return Vec::new();
        }
        info!(count = ids.len(), "Unread events to process");

        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = self.process_event(&id).await;

            match &outcome {
                EventOutcome::Processed | EventOutcome::Skipped(_) => {
                    // Idempotent on the source side; a failure here leaves
                    // the event unread and the seen-set skips the rescore
                    // while retrying the mark next cycle.
                    if let Err(e) = self.source.mark_read(&id).await {
                        warn!(event = %id, error = %e, "Mark-as-read failed; will retry next cycle");
                    }
                }
                EventOutcome::Failed(reason) => {
                    warn!(event = %id, reason = %reason, "Event failed; left unread for retry");
                }
            }

            outcomes.push((id, outcome));
        }
        outcomes
    }

    /// Handle one event end to end. Never marks anything consumed itself;
    /// that is the cycle's job, driven by the returned outcome.
    async fn process_event(&mut self, id: &str) -> EventOutcome {
        if self.seen.contains(id) {
            return EventOutcome::Skipped("already processed".to_string());
        }

        let message = match self.source.fetch(id).await {
            Ok(m) => m,
            Err(e) => return EventOutcome::Failed(format!("fetch: {e}")),
        };

        // Body, then subject, then the extractor's own placeholder.
        let text = if !message.body.trim().is_empty() {
            message.body.as_str()
        } else {
            message.subject.as_str()
        };
        let comm = self.extractor.extract(text);
        let tx = self.transactions.transaction_for(&message);

        match self.client.submit(&tx, &comm).await {
            Ok(decision) => {
                info!(
                    event = %id,
                    subject = %truncate(&message.subject, 70),
                    fraud_probability = decision.fraud_probability,
                    decision = ?decision.decision,
                    "Event scored"
                );
                self.seen.insert(id.to_string());
                EventOutcome::Processed
            }
            Err(e) => EventOutcome::Failed(format!("submit: {e}")),
        }
    }

    /// Ids processed so far in this run.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
