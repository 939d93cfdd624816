//! Transaction-side input for watched events.
//!
//! No transaction feed is tied to mailbox events yet, so the watcher pairs
//! each message with a synthesized transaction. The trait is the real
//! contract; `SyntheticTransactions` is an explicit stand-in to be
//! replaced by an observed-transaction source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::TransactionFeatures;
use crate::watcher::mailbox::MailMessage;

/// Supplies the transaction features to pair with a mailbox event.
pub trait TransactionProvider {
    fn transaction_for(&mut self, message: &MailMessage) -> TransactionFeatures;
}

/// Random transactions over plausible retail ranges.
pub struct SyntheticTransactions {
    rng: StdRng,
}

impl SyntheticTransactions {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SyntheticTransactions {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionProvider for SyntheticTransactions {
    fn transaction_for(&mut self, _message: &MailMessage) -> TransactionFeatures {
        TransactionFeatures {
            amount: (self.rng.gen_range(100.0..100_000.0) * 100.0_f64).round() / 100.0,
            geo_mismatch: u8::from(self.rng.gen_bool(0.5)),
            is_new_device: u8::from(self.rng.gen_bool(0.5)),
            prior_tx_count_1h: self.rng.gen_range(0..=5),
            prior_tx_count_24h: self.rng.gen_range(0..=20),
            time_since_last_tx_min: (self.rng.gen_range(0.5..180.0) * 10.0_f64).round() / 10.0,
        }
    }
}
