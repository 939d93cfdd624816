//! Latest-decision register shared between the serving pipeline and its
//! observers.
//!
//! A single slot holding the most recent [`Decision`], overwritten whole on
//! every pipeline run. Deliberately lossy: history is the consumer's
//! concern. Concurrent writers race with last-write-wins semantics on the
//! entire record; readers always see a complete decision because the slot
//! swaps one `Arc` rather than mutating fields in place.

use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::error::SnapshotError;
use crate::types::Decision;

/// Process-wide single-slot store for the most recent decision.
#[derive(Default)]
pub struct AlertStore {
    slot: RwLock<Option<Arc<Decision>>>,
}

impl AlertStore {
    /// An empty store. A freshly constructed store never carries data from
    /// a previous process incarnation.
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Overwrite the slot with a new decision. Never merges.
    pub fn set(&self, decision: Decision) {
        let mut slot = match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(Arc::new(decision));
    }

    /// Read the current decision, if any. Never blocks writers beyond the
    /// duration of the pointer clone.
    pub fn get(&self) -> Option<Arc<Decision>> {
        let slot = match self.slot.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.clone()
    }

    /// Reset to empty. Called exactly once, at startup, before the first
    /// request is served.
    pub fn clear(&self) {
        let mut slot = match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = None;
    }
}

/// Best-effort durable copy of the latest decision. The in-memory store
/// stays authoritative; a failure here is logged by the caller and the
/// request still succeeds.
pub fn persist_snapshot<P: AsRef<Path>>(path: P, decision: &Decision) -> Result<(), SnapshotError> {
    let json = serde_json::to_vec(decision)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Remove any snapshot left behind by a previous process incarnation, so a
/// restarted server can never serve stale data from disk either.
pub fn remove_stale_snapshot<P: AsRef<Path>>(path: P) {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "Removed stale decision snapshot"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not remove stale snapshot"),
    }
}
