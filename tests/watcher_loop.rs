//! Watcher protocol tests with injected fakes: retry, at-least-once
//! delivery, and seen-set dedupe, all without network calls.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use fraud_fusion_pipeline::error::ExternalSourceError;
use fraud_fusion_pipeline::types::{
    CommunicationFeatures, Decision, TransactionFeatures,
};
use fraud_fusion_pipeline::watcher::{
    EventOutcome, MailMessage, MailboxSource, ScoringClient, TransactionProvider, Watcher,
    WatcherConfig,
};

#[derive(Default)]
struct FakeSourceState {
    unread: Vec<String>,
    messages: HashMap<String, MailMessage>,
    fail_list_once: bool,
    fail_fetch_once: HashSet<String>,
    fail_mark_once: HashSet<String>,
    marked: Vec<String>,
}

#[derive(Clone, Default)]
struct FakeSource {
    state: Arc<Mutex<FakeSourceState>>,
}

impl FakeSource {
    fn with_messages(messages: Vec<MailMessage>) -> Self {
        let source = Self::default();
        {
            let mut state = source.state.lock().unwrap();
            for m in messages {
                state.unread.push(m.id.clone());
                state.messages.insert(m.id.clone(), m);
            }
        }
        source
    }

    fn marked(&self) -> Vec<String> {
        self.state.lock().unwrap().marked.clone()
    }

    fn unread(&self) -> Vec<String> {
        self.state.lock().unwrap().unread.clone()
    }
}

impl MailboxSource for FakeSource {
    async fn list_unread(&self, limit: usize) -> Result<Vec<String>, ExternalSourceError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_list_once {
            state.fail_list_once = false;
            return Err(ExternalSourceError::Network("poll down".to_string()));
        }
        Ok(state.unread.iter().take(limit).cloned().collect())
    }

    async fn fetch(&self, id: &str) -> Result<MailMessage, ExternalSourceError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_fetch_once.remove(id) {
            return Err(ExternalSourceError::Network("fetch down".to_string()));
        }
        state
            .messages
            .get(id)
            .cloned()
            .ok_or(ExternalSourceError::Status(404))
    }

    async fn mark_read(&self, id: &str) -> Result<(), ExternalSourceError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_mark_once.remove(id) {
            return Err(ExternalSourceError::Network("mark down".to_string()));
        }
        // Idempotent: marking an already-consumed id records the call but
        // is never an error.
        state.marked.push(id.to_string());
        state.unread.retain(|u| u != id);
        Ok(())
    }
}

#[derive(Default)]
struct FakeClientState {
    fail_once: bool,
    submissions: Vec<(TransactionFeatures, CommunicationFeatures)>,
}

#[derive(Clone, Default)]
struct FakeClient {
    state: Arc<Mutex<FakeClientState>>,
}

impl FakeClient {
    fn failing_once() -> Self {
        let client = Self::default();
        client.state.lock().unwrap().fail_once = true;
        client
    }

    fn submissions(&self) -> Vec<(TransactionFeatures, CommunicationFeatures)> {
        self.state.lock().unwrap().submissions.clone()
    }
}

impl ScoringClient for FakeClient {
    async fn submit(
        &self,
        tx: &TransactionFeatures,
        comm: &CommunicationFeatures,
    ) -> Result<Decision, ExternalSourceError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_once {
            state.fail_once = false;
            return Err(ExternalSourceError::Status(500));
        }
        state.submissions.push((tx.clone(), comm.clone()));
        Ok(Decision::build(tx, comm, 0.2, 0.3, 0.25))
    }
}

struct FixedTransactions;

impl TransactionProvider for FixedTransactions {
    fn transaction_for(&mut self, _message: &MailMessage) -> TransactionFeatures {
        TransactionFeatures {
            amount: 1_000.0,
            geo_mismatch: 0,
            is_new_device: 0,
            prior_tx_count_1h: 1,
            prior_tx_count_24h: 2,
            time_since_last_tx_min: 60.0,
        }
    }
}

fn message(id: &str, subject: &str, body: &str) -> MailMessage {
    MailMessage {
        id: id.to_string(),
        subject: subject.to_string(),
        body: body.to_string(),
    }
}

fn watcher(source: FakeSource, client: FakeClient) -> Watcher<FakeSource, FakeClient, FixedTransactions> {
    Watcher::new(source, client, FixedTransactions, WatcherConfig::default())
}

#[tokio::test]
async fn processed_events_are_scored_and_marked_once() {
    let source = FakeSource::with_messages(vec![
        message("m1", "urgent", "verify your account immediately"),
        message("m2", "lunch", "see you at noon"),
    ]);
    let client = FakeClient::default();
    let mut watcher = watcher(source.clone(), client.clone());

    let outcomes = watcher.run_cycle().await;
    assert_eq!(
        outcomes,
        vec![
            ("m1".to_string(), EventOutcome::Processed),
            ("m2".to_string(), EventOutcome::Processed),
        ]
    );
    assert_eq!(client.submissions().len(), 2);
    assert_eq!(source.marked(), vec!["m1".to_string(), "m2".to_string()]);
    assert!(source.unread().is_empty());

    // Drained source: the next cycle is empty.
    assert!(watcher.run_cycle().await.is_empty());
    assert_eq!(client.submissions().len(), 2);
}

#[tokio::test]
async fn fetch_failure_retries_and_scores_exactly_once() {
    let source = FakeSource::with_messages(vec![message("m1", "s", "b")]);
    source.state.lock().unwrap().fail_fetch_once.insert("m1".to_string());
    let client = FakeClient::default();
    let mut watcher = watcher(source.clone(), client.clone());

    let outcomes = watcher.run_cycle().await;
    assert!(matches!(outcomes[0].1, EventOutcome::Failed(_)));
    assert!(source.marked().is_empty());
    assert_eq!(client.submissions().len(), 0);

    // Source recovered: the same event goes through exactly once.
    let outcomes = watcher.run_cycle().await;
    assert_eq!(outcomes[0].1, EventOutcome::Processed);
    assert_eq!(client.submissions().len(), 1);
    assert_eq!(source.marked(), vec!["m1".to_string()]);
}

#[tokio::test]
async fn submit_failure_retries_and_scores_exactly_once() {
    let source = FakeSource::with_messages(vec![message("m1", "s", "b")]);
    let client = FakeClient::failing_once();
    let mut watcher = watcher(source.clone(), client.clone());

    let outcomes = watcher.run_cycle().await;
    assert!(matches!(outcomes[0].1, EventOutcome::Failed(_)));
    assert!(source.marked().is_empty());

    let outcomes = watcher.run_cycle().await;
    assert_eq!(outcomes[0].1, EventOutcome::Processed);
    assert_eq!(client.submissions().len(), 1);
    assert_eq!(source.marked(), vec!["m1".to_string()]);
}

#[tokio::test]
async fn mark_failure_after_success_never_rescores() {
    let source = FakeSource::with_messages(vec![message("m1", "s", "b")]);
    source.state.lock().unwrap().fail_mark_once.insert("m1".to_string());
    let client = FakeClient::default();
    let mut watcher = watcher(source.clone(), client.clone());

    // Pipeline succeeds but the mark call fails: the event stays unread.
    let outcomes = watcher.run_cycle().await;
    assert_eq!(outcomes[0].1, EventOutcome::Processed);
    assert_eq!(client.submissions().len(), 1);
    assert!(source.marked().is_empty());
    assert_eq!(source.unread(), vec!["m1".to_string()]);

    // Next cycle: the seen-set skips the rescore and retries the mark.
    let outcomes = watcher.run_cycle().await;
    assert!(matches!(outcomes[0].1, EventOutcome::Skipped(_)));
    assert_eq!(client.submissions().len(), 1);
    assert_eq!(source.marked(), vec!["m1".to_string()]);
    assert!(source.unread().is_empty());
}

#[tokio::test]
async fn poll_failure_is_an_empty_cycle_not_a_crash() {
    let source = FakeSource::with_messages(vec![message("m1", "s", "b")]);
    source.state.lock().unwrap().fail_list_once = true;
    let client = FakeClient::default();
    let mut watcher = watcher(source.clone(), client.clone());

    assert!(watcher.run_cycle().await.is_empty());

    // The loop survives and the event is processed next cycle.
    let outcomes = watcher.run_cycle().await;
    assert_eq!(outcomes[0].1, EventOutcome::Processed);
}

#[tokio::test]
async fn empty_body_falls_back_to_subject_then_placeholder() {
    let source = FakeSource::with_messages(vec![
        message("m1", "urgent verify", ""),
        message("m2", "", ""),
    ]);
    let client = FakeClient::default();
    let mut watcher = watcher(source.clone(), client.clone());
    watcher.run_cycle().await;

    let submissions = client.submissions();
    let extractor = fraud_fusion_pipeline::FeatureExtractor::new();
    // m1: scored from the subject.
    assert_eq!(submissions[0].1, extractor.extract("urgent verify"));
    // m2: nothing to read anywhere, scored as the placeholder.
    assert_eq!(submissions[1].1, extractor.extract(""));
    assert!(submissions[1].1.urgency_score == 0.0);
}

#[tokio::test]
async fn batch_limit_bounds_each_cycle() {
    let messages: Vec<MailMessage> = (0..15)
        .map(|i| message(&format!("m{i}"), "s", "b"))
        .collect();
    let source = FakeSource::with_messages(messages);
    let client = FakeClient::default();
    let mut watcher = Watcher::new(
        source.clone(),
        client.clone(),
        FixedTransactions,
        WatcherConfig {
            poll_interval: std::time::Duration::from_secs(15),
            max_messages: 10,
        },
    );

    assert_eq!(watcher.run_cycle().await.len(), 10);
    assert_eq!(watcher.run_cycle().await.len(), 5);
    assert_eq!(client.submissions().len(), 15);
}
