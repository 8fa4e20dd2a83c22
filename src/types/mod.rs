//! Type definitions for the risk engine

pub mod thresholds;
pub mod transaction;
pub mod verdict;

pub use thresholds::RuleThresholds;
pub use transaction::{TransactionMessage, TransactionRecord, REQUIRED_COLUMNS};
pub use verdict::{
    ClassifierSignal, EvaluationResult, FraudRule, RuleViolation, VerdictRecord, VerdictReport,
};
