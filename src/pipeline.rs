//! Per-message evaluation and bounded concurrency for the streaming service

use crate::consumer::decode_message;
use crate::metrics::PipelineMetrics;
use crate::models::classifier::Classifier;
use crate::types::thresholds::RuleThresholds;
use crate::types::verdict::VerdictReport;
use crate::verdict::combine;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

/// Caps the number of transactions evaluated at once.
///
/// Each spawned evaluation holds a permit until it has published its
/// verdict, so [`WorkerPool::drain`] returns only once all of them are done.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    workers: u32,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self> {
        let workers = u32::try_from(workers).context("Worker count does not fit in u32")?;
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(workers as usize)),
            workers,
        })
    }

    /// Wait for a free worker slot
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker pool is closed")
    }

    /// Evaluations currently holding a slot
    pub fn in_flight(&self) -> usize {
        (self.workers as usize).saturating_sub(self.semaphore.available_permits())
    }

    /// Wait for every in-flight evaluation to finish, then refuse new work
    pub async fn drain(&self) -> Result<()> {
        let _all = self
            .semaphore
            .acquire_many(self.workers)
            .await
            .context("Worker pool is closed")?;
        self.semaphore.close();
        Ok(())
    }
}

/// Decode one transaction payload, classify it and combine the verdict.
///
/// Returns `None` when the message cannot be evaluated; the failure is
/// logged and counted.
pub fn evaluate_payload(
    payload: &[u8],
    classifier: &dyn Classifier,
    thresholds: &RuleThresholds,
    metrics: &PipelineMetrics,
) -> Option<VerdictReport> {
    let start_time = Instant::now();

    let transaction = match decode_message(payload) {
        Ok(transaction) => transaction,
        Err(e) => {
            metrics.record_failure();
            warn!(error = %format!("{:#}", e), "Dropping transaction message");
            return None;
        }
    };
    let tx_id = transaction.transaction_id;

    let signal = match classifier.predict(&transaction.record) {
        Ok(signal) => signal,
        Err(e) => {
            metrics.record_failure();
            error!(transaction_id = %tx_id, error = %format!("{:#}", e), "Classifier failed");
            return None;
        }
    };

    let result = combine(&transaction.record, thresholds, signal);
    let processing_time = start_time.elapsed();
    metrics.record_verdict(processing_time, signal, &result);

    if result.is_fraudulent {
        info!(
            transaction_id = %tx_id,
            ml_prediction = signal.as_u8(),
            rules = %result.triggered_rules_summary(),
            processing_time_us = processing_time.as_micros() as u64,
            "Transaction flagged"
        );
    } else {
        debug!(
            transaction_id = %tx_id,
            processing_time_us = processing_time.as_micros() as u64,
            "Transaction cleared"
        );
    }

    Some(VerdictReport::new(tx_id, signal, result))
}
