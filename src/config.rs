//! Configuration management for the risk engine

use crate::types::thresholds::RuleThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub rules: RuleThresholds,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming transactions
    pub transaction_subject: String,
    /// Subject for outgoing verdicts
    pub verdict_subject: String,
}

/// Classifier model configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Fraud probability at or above which the classifier signals fraud
    pub probability_threshold: f64,
    /// Number of threads for ONNX inference
    pub onnx_threads: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: "models/fraud_classifier.onnx".to_string(),
            probability_threshold: 0.5,
            onnx_threads: 1,
        }
    }
}

/// Streaming pipeline configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum transactions evaluated concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    pub metrics_interval_secs: u64,
    /// Seconds to wait for in-flight transactions on shutdown
    pub shutdown_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            metrics_interval_secs: 30,
            shutdown_timeout_secs: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        self.rules
            .validate()
            .context("Invalid rule thresholds")?;

        if !(0.0..=1.0).contains(&self.classifier.probability_threshold) {
            anyhow::bail!(
                "classifier.probability_threshold must be within [0, 1], got {}",
                self.classifier.probability_threshold
            );
        }

        if self.pipeline.workers == 0 {
            anyhow::bail!("pipeline.workers must be at least 1");
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                transaction_subject: "transactions".to_string(),
                verdict_subject: "fraud.verdicts".to_string(),
            },
            classifier: ClassifierConfig::default(),
            rules: RuleThresholds::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
