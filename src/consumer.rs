//! Alert consumer: polls the latest-decision endpoint and maintains a
//! deduplicated, most-recent-first alert history.
//!
//! The store holds only one slot, so history durability lives here, not in
//! the store. Dedupe is by content fingerprint: re-reading an unchanged
//! slot is a no-op, and an empty slot or a transport error renders as a
//! waiting state rather than an error.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::Decision;

/// One entry in the alert history. The id and timestamp are assigned at
/// observation time by the consumer; the decision itself carries neither.
#[derive(Debug, Clone)]
pub struct AlertRecord {
    pub record_id: Uuid,
    pub observed_at: DateTime<Utc>,
    pub fingerprint: String,
    pub decision: Decision,
}

/// Insertion-ordered history, most recent first, deduplicated by content
/// fingerprint.
#[derive(Default)]
pub struct AlertHistory {
    records: Vec<AlertRecord>,
    seen: HashSet<String>,
}

impl AlertHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one store snapshot. Returns `true` when the decision was new
    /// and prepended, `false` for a redundant read.
    pub fn observe(&mut self, decision: Decision) -> bool {
        let fingerprint = decision.fingerprint();
        if !self.seen.insert(fingerprint.clone()) {
            return false;
        }

        self.records.insert(
            0,
            AlertRecord {
                record_id: Uuid::new_v4(),
                observed_at: Utc::now(),
                fingerprint,
                decision,
            },
        );
        true
    }

    /// All records, most recent first.
    pub fn records(&self) -> &[AlertRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&AlertRecord> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Result of one poll of the latest-decision endpoint.
#[derive(Debug, PartialEq, Eq)]
pub enum FeedUpdate {
    /// A decision not seen before was appended to the history.
    NewAlert,
    /// The store still holds the last decision we already recorded.
    Unchanged,
    /// Empty store or unreachable endpoint; nothing to show yet.
    Waiting,
}

/// Polling consumer over `GET /latest`.
pub struct AlertFeed {
    endpoint: String,
    http: reqwest::Client,
    history: AlertHistory,
}

impl AlertFeed {
    pub fn new(endpoint: &str, timeout: std::time::Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.to_string(),
            http,
            history: AlertHistory::new(),
        }
    }

    pub fn history(&self) -> &AlertHistory {
        &self.history
    }

    /// Fetch the current store contents once and fold them into the
    /// history. Transport and decode failures degrade to `Waiting`.
    pub async fn poll_once(&mut self) -> FeedUpdate {
        let response = match self.http.get(&self.endpoint).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "Latest-decision endpoint unreachable");
                return FeedUpdate::Waiting;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), "Latest-decision endpoint errored");
            return FeedUpdate::Waiting;
        }

        let value: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "Unparseable latest-decision body");
                return FeedUpdate::Waiting;
            }
        };

        // An empty object is the store's "nothing yet" shape.
        if value.as_object().is_some_and(|o| o.is_empty()) {
            return FeedUpdate::Waiting;
        }

        match serde_json::from_value::<Decision>(value) {
            Ok(decision) => {
                if self.history.observe(decision) {
                    FeedUpdate::NewAlert
                } else {
                    FeedUpdate::Unchanged
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Latest-decision body did not decode as a decision");
                FeedUpdate::Waiting
            }
        }
    }
}
