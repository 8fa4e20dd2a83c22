//! Verdict statistics for the streaming pipeline.

use crate::types::verdict::{ClassifierSignal, EvaluationResult, FraudRule};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const MAX_TIMING_SAMPLES: usize = 10_000;

/// Metrics collector for evaluated transactions
pub struct PipelineMetrics {
    /// Transactions that produced a verdict
    pub transactions_evaluated: AtomicU64,
    /// Transactions the classifier labelled fraudulent
    pub ml_flagged: AtomicU64,
    /// Transactions with at least one fired rule
    pub rules_flagged: AtomicU64,
    /// Transactions with a fraudulent final verdict
    pub total_flagged: AtomicU64,
    /// Messages that could not be evaluated or delivered
    pub failures: AtomicU64,
    /// Verdicts that were evaluated but never reached the verdict subject
    pub publish_failures: AtomicU64,
    rule_hits: RwLock<HashMap<FraudRule, u64>>,
    /// Processing times in microseconds
    processing_times: RwLock<Vec<u64>>,
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            transactions_evaluated: AtomicU64::new(0),
            ml_flagged: AtomicU64::new(0),
            rules_flagged: AtomicU64::new(0),
            total_flagged: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            rule_hits: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record one verdict
    pub fn record_verdict(
        &self,
        processing_time: Duration,
        signal: ClassifierSignal,
        result: &EvaluationResult,
    ) {
        self.transactions_evaluated.fetch_add(1, Ordering::Relaxed);
        if signal.is_fraudulent() {
            self.ml_flagged.fetch_add(1, Ordering::Relaxed);
        }
        if result.rules_triggered() {
            self.rules_flagged.fetch_add(1, Ordering::Relaxed);
        }
        if result.is_fraudulent {
            self.total_flagged.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut hits) = self.rule_hits.write() {
            for violation in &result.violations {
                *hits.entry(violation.rule).or_insert(0) += 1;
            }
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > MAX_TIMING_SAMPLES {
                times.drain(0..MAX_TIMING_SAMPLES / 2);
            }
        }
    }

    /// Record a message that failed decoding or inference
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a verdict that could not be published
    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// How often each rule fired
    pub fn rule_hits(&self) -> HashMap<FraudRule, u64> {
        self.rule_hits
            .read()
            .map(|hits| hits.clone())
            .unwrap_or_default()
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Transactions per second since start
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_evaluated.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        let evaluated = self.transactions_evaluated.load(Ordering::Relaxed);
        let total_flagged = self.total_flagged.load(Ordering::Relaxed);
        let flag_rate = if evaluated > 0 {
            (total_flagged as f64 / evaluated as f64) * 100.0
        } else {
            0.0
        };
        let processing = self.get_processing_stats();

        info!(
            evaluated = evaluated,
            ml_flagged = self.ml_flagged.load(Ordering::Relaxed),
            rules_flagged = self.rules_flagged.load(Ordering::Relaxed),
            total_flagged = total_flagged,
            failures = self.failures.load(Ordering::Relaxed),
            publish_failures = self.publish_failures.load(Ordering::Relaxed),
            flag_rate = format!("{:.1}%", flag_rate),
            throughput = format!("{:.1} tx/s", self.get_throughput()),
            "Verdict summary"
        );
        info!(
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            max_us = processing.max_us,
            "Processing latency"
        );

        let hits = self.rule_hits();
        for rule in FraudRule::ALL {
            info!(
                rule = rule.name(),
                hits = hits.get(&rule).copied().unwrap_or(0),
                "Rule hits"
            );
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Prints a metrics summary on a fixed interval
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
