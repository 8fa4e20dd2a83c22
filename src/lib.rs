//! Transaction Risk Engine
//!
//! Flags suspicious card transactions by combining a fixed set of
//! threshold rules with a binary classifier prediction. Either source alone
//! is sufficient to flag a transaction.

pub mod batch;
pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_extractor;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod producer;
pub mod rules;
pub mod types;
pub mod verdict;

pub use config::AppConfig;
pub use error::{EvaluationError, SchemaError, ThresholdError};
pub use models::{Classifier, FixedClassifier, OnnxClassifier};
pub use rules::evaluate_rules;
pub use types::{
    ClassifierSignal, EvaluationResult, FraudRule, RuleThresholds, RuleViolation,
    TransactionRecord, VerdictRecord, VerdictReport,
};
pub use verdict::{combine, combine_raw};
