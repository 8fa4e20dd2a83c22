//! Merges rule violations with the classifier prediction.
//!
//! Either source alone is enough to flag a transaction: a positive
//! classifier signal, or at least one fired rule.

use crate::error::EvaluationError;
use crate::rules::evaluate_rules;
use crate::types::thresholds::RuleThresholds;
use crate::types::transaction::TransactionRecord;
use crate::types::verdict::{ClassifierSignal, EvaluationResult};

/// Produce the final verdict for one transaction.
pub fn combine(
    record: &TransactionRecord,
    thresholds: &RuleThresholds,
    signal: ClassifierSignal,
) -> EvaluationResult {
    let violations = evaluate_rules(record, thresholds);
    let is_fraudulent = signal.is_fraudulent() || !violations.is_empty();

    EvaluationResult {
        is_fraudulent,
        violations,
    }
}

/// Like [`combine`], for a classifier that reports an integer label.
///
/// Anything other than 0 or 1 is rejected instead of being coerced.
pub fn combine_raw(
    record: &TransactionRecord,
    thresholds: &RuleThresholds,
    raw_signal: i64,
) -> Result<EvaluationResult, EvaluationError> {
    let signal = ClassifierSignal::try_from(raw_signal)?;
    Ok(combine(record, thresholds, signal))
}
