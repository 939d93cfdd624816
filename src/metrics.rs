//! In-process performance and outcome counters for the serving pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::info;

use crate::types::DecisionLabel;

/// Counters and latency buffers for the serving side.
pub struct ServiceMetrics {
    /// Prediction requests completed.
    pub requests_processed: AtomicU64,
    /// Decisions by label ("high" / "low").
    decisions_by_label: RwLock<HashMap<String, u64>>,
    /// Request processing times in microseconds, bounded window.
    processing_times: RwLock<Vec<u64>>,
    /// Fraud probability distribution in ten equal buckets.
    score_buckets: RwLock<[u64; 10]>,
    /// Start of the observation window, for throughput.
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests_processed: AtomicU64::new(0),
            decisions_by_label: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one completed prediction.
    pub fn record_request(&self, processing_time: Duration, fraud_probability: f64) {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Bounded window so a long-running process doesn't grow forever.
            if times.len() > 10_000 {
                times.drain(0..5_000);
            }
        }

        let bucket = (fraud_probability * 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record the label attached to a decision.
    pub fn record_decision(&self, label: DecisionLabel) {
        let key = match label {
            DecisionLabel::HighRisk => "high",
            DecisionLabel::LowRisk => "low",
        };
        if let Ok(mut by_label) = self.decisions_by_label.write() {
            *by_label.entry(key.to_string()).or_insert(0) += 1;
        }
    }

    /// Latency percentiles over the current window.
    pub fn processing_stats(&self) -> ProcessingStats {
        let times = match self.processing_times.read() {
            Ok(t) => t,
            Err(p) => p.into_inner(),
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();
        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
        }
    }

    /// Requests per second since startup.
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Snapshot of the label counters.
    pub fn decisions_by_label(&self) -> HashMap<String, u64> {
        match self.decisions_by_label.read() {
            Ok(m) => m.clone(),
            Err(p) => p.into_inner().clone(),
        }
    }

    /// Snapshot of the probability distribution.
    pub fn score_distribution(&self) -> [u64; 10] {
        match self.score_buckets.read() {
            Ok(b) => *b,
            Err(p) => *p.into_inner(),
        }
    }

    /// Log a one-page summary of the current counters.
    pub fn log_summary(&self) {
        let requests = self.requests_processed.load(Ordering::Relaxed);
        let stats = self.processing_stats();
        let by_label = self.decisions_by_label();
        let distribution = self.score_distribution();

        info!(
            requests,
            throughput = format!("{:.1} req/s", self.throughput()),
            mean_us = stats.mean_us,
            p50_us = stats.p50_us,
            p95_us = stats.p95_us,
            p99_us = stats.p99_us,
            "Serving metrics"
        );
        for (label, count) in &by_label {
            info!(label = %label, count, "Decisions by label");
        }

        let total: u64 = distribution.iter().sum();
        if total > 0 {
            for (i, &count) in distribution.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                info!(
                    bucket = format!("{:.1}-{:.1}", i as f64 / 10.0, (i + 1) as f64 / 10.0),
                    count,
                    pct = format!("{:.1}%", count as f64 / total as f64 * 100.0),
                    "Fraud probability distribution"
                );
            }
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics over the current window.
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
}

/// Periodic background task logging the metrics summary.
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Run forever, logging a summary every interval.
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.log_summary();
        }
    }
}
