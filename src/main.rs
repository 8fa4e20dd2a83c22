//! Transaction Risk Engine - streaming service
//!
//! Consumes transactions from NATS, obtains the classifier prediction,
//! applies the fraud rules and publishes a verdict for every transaction.

use anyhow::{Context, Result};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use transaction_risk_engine::{
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    consumer::TransactionConsumer,
    logging::init_logging,
    metrics::{MetricsReporter, PipelineMetrics},
    models::{Classifier, OnnxClassifier},
    pipeline::{evaluate_payload, WorkerPool},
    producer::VerdictProducer,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    init_logging(&config.logging);
    info!(config = %config_path, "Starting transaction risk engine");
    info!(
        distance_home_threshold = config.rules.distance_home_threshold,
        distance_last_tx_threshold = config.rules.distance_last_tx_threshold,
        purchase_ratio_threshold = config.rules.purchase_ratio_threshold,
        "Rule thresholds loaded"
    );

    let classifier: Arc<dyn Classifier> = Arc::new(OnnxClassifier::new(&config.classifier)?);
    info!(
        model = classifier.name(),
        probability_threshold = config.classifier.probability_threshold,
        "Classifier ready"
    );

    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = TransactionConsumer::new(client.clone(), &config.nats.transaction_subject);
    let producer = Arc::new(VerdictProducer::new(
        client.clone(),
        &config.nats.verdict_subject,
    ));
    info!(
        workers = config.pipeline.workers,
        transactions = consumer.subject(),
        verdicts = producer.subject(),
        "Starting evaluation loop"
    );

    let metrics = Arc::new(PipelineMetrics::new());
    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let pool = WorkerPool::new(config.pipeline.workers)?;
    let thresholds = config.rules;

    let mut subscription = consumer.subscribe().await?;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let message = tokio::select! {
            next = subscription.next() => match next {
                Some(message) => message,
                None => break,
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        };

        let permit = pool.acquire().await?;
        let classifier = classifier.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let _permit = permit;

            let Some(report) =
                evaluate_payload(&message.payload, classifier.as_ref(), &thresholds, &metrics)
            else {
                return;
            };

            if let Err(e) = producer.publish(&report).await {
                metrics.record_publish_failure();
                error!(
                    transaction_id = %report.transaction_id,
                    error = %e,
                    "Failed to publish verdict"
                );
            }
        });
    }

    info!(in_flight = pool.in_flight(), "Waiting for in-flight transactions");
    let drain_timeout = Duration::from_secs(config.pipeline.shutdown_timeout_secs);
    match tokio::time::timeout(drain_timeout, pool.drain()).await {
        Ok(drained) => drained?,
        Err(_) => warn!(
            in_flight = pool.in_flight(),
            timeout_secs = config.pipeline.shutdown_timeout_secs,
            "Shutdown timed out, in-flight verdicts were not published"
        ),
    }

    if let Err(e) = client.flush().await {
        error!(error = %e, "Failed to flush pending verdicts");
    }

    info!("Risk engine shutting down");
    metrics.print_summary();

    Ok(())
}
