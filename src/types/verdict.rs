//! Verdict data structures produced by the rule engine and the combiner

use crate::error::EvaluationError;
use crate::types::transaction::TransactionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four fixed fraud rules, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudRule {
    DistanceFromHome,
    DistanceFromLastTransaction,
    PurchaseRatio,
    OnlineNewRetailerWithoutChip,
}

impl FraudRule {
    pub const ALL: [FraudRule; 4] = [
        FraudRule::DistanceFromHome,
        FraudRule::DistanceFromLastTransaction,
        FraudRule::PurchaseRatio,
        FraudRule::OnlineNewRetailerWithoutChip,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FraudRule::DistanceFromHome => "distance_from_home",
            FraudRule::DistanceFromLastTransaction => "distance_from_last_transaction",
            FraudRule::PurchaseRatio => "purchase_ratio",
            FraudRule::OnlineNewRetailerWithoutChip => "online_new_retailer_without_chip",
        }
    }
}

/// One triggered rule with its human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule: FraudRule,
    pub description: String,
}

impl RuleViolation {
    pub fn new(rule: FraudRule, description: impl Into<String>) -> Self {
        Self {
            rule,
            description: description.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Binary prediction produced by an external classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "i64")]
pub enum ClassifierSignal {
    Legitimate,
    Fraudulent,
}

impl ClassifierSignal {
    pub fn is_fraudulent(&self) -> bool {
        matches!(self, ClassifierSignal::Fraudulent)
    }

    pub fn as_u8(&self) -> u8 {
        u8::from(*self)
    }
}

impl From<bool> for ClassifierSignal {
    fn from(fraudulent: bool) -> Self {
        if fraudulent {
            ClassifierSignal::Fraudulent
        } else {
            ClassifierSignal::Legitimate
        }
    }
}

impl From<ClassifierSignal> for u8 {
    fn from(signal: ClassifierSignal) -> Self {
        match signal {
            ClassifierSignal::Legitimate => 0,
            ClassifierSignal::Fraudulent => 1,
        }
    }
}

impl TryFrom<i64> for ClassifierSignal {
    type Error = EvaluationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ClassifierSignal::Legitimate),
            1 => Ok(ClassifierSignal::Fraudulent),
            other => Err(EvaluationError::InvalidClassifierSignal(other.to_string())),
        }
    }
}

impl FromStr for ClassifierSignal {
    type Err = EvaluationError;

    /// Parse a textual `0` or `1`
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| EvaluationError::InvalidClassifierSignal(raw.to_string()))?;
        Self::try_from(value)
    }
}

/// Final verdict for one transaction together with the rule evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub is_fraudulent: bool,
    pub violations: Vec<RuleViolation>,
}

impl EvaluationResult {
    pub fn rules_triggered(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Violations joined with `"; "`, or `"None"` when no rule fired.
    pub fn triggered_rules_summary(&self) -> String {
        if self.violations.is_empty() {
            "None".to_string()
        } else {
            self.violations
                .iter()
                .map(RuleViolation::as_str)
                .collect::<Vec<_>>()
                .join("; ")
        }
    }
}

/// Flat output row: the input fields followed by the verdict columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub distance_from_home: f64,
    pub distance_from_last_transaction: f64,
    pub ratio_to_median_purchase_price: f64,
    pub repeat_retailer: u8,
    pub used_chip: u8,
    pub used_pin_number: u8,
    pub online_order: u8,
    pub ml_prediction: u8,
    /// `Yes` or `No`
    pub rules_triggered: String,
    pub triggered_rules: String,
    pub final_prediction: u8,
}

impl VerdictRecord {
    pub fn new(
        record: &TransactionRecord,
        signal: ClassifierSignal,
        result: &EvaluationResult,
    ) -> Self {
        Self {
            distance_from_home: record.distance_from_home,
            distance_from_last_transaction: record.distance_from_last_transaction,
            ratio_to_median_purchase_price: record.ratio_to_median_purchase_price,
            repeat_retailer: u8::from(record.repeat_retailer),
            used_chip: u8::from(record.used_chip),
            used_pin_number: u8::from(record.used_pin_number),
            online_order: u8::from(record.online_order),
            ml_prediction: signal.as_u8(),
            rules_triggered: if result.rules_triggered() { "Yes" } else { "No" }.to_string(),
            triggered_rules: result.triggered_rules_summary(),
            final_prediction: u8::from(result.is_fraudulent),
        }
    }
}

/// Verdict published on the message bus for a streamed transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictReport {
    /// Unique report identifier
    pub report_id: String,

    /// Transaction the verdict belongs to
    pub transaction_id: String,

    /// Raw classifier prediction
    pub ml_prediction: ClassifierSignal,

    /// Final combined verdict
    pub is_fraudulent: bool,

    /// Rules that fired, in evaluation order
    pub violations: Vec<RuleViolation>,

    pub timestamp: DateTime<Utc>,
}

impl VerdictReport {
    pub fn new(
        transaction_id: String,
        ml_prediction: ClassifierSignal,
        result: EvaluationResult,
    ) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            transaction_id,
            ml_prediction,
            is_fraudulent: result.is_fraudulent,
            violations: result.violations,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_conversions() {
        assert_eq!(ClassifierSignal::try_from(0_i64), Ok(ClassifierSignal::Legitimate));
        assert_eq!(ClassifierSignal::try_from(1_i64), Ok(ClassifierSignal::Fraudulent));
        assert_eq!(ClassifierSignal::from(true), ClassifierSignal::Fraudulent);
        assert_eq!(ClassifierSignal::Fraudulent.as_u8(), 1);
    }

    #[test]
    fn test_signal_rejects_non_binary_values() {
        assert_eq!(
            ClassifierSignal::try_from(2_i64),
            Err(EvaluationError::InvalidClassifierSignal("2".to_string()))
        );
        assert!(ClassifierSignal::try_from(-1_i64).is_err());
        assert!(serde_json::from_str::<ClassifierSignal>("3").is_err());
    }

    #[test]
    fn test_signal_parses_from_text() {
        assert_eq!(" 1 ".parse::<ClassifierSignal>(), Ok(ClassifierSignal::Fraudulent));
        assert_eq!("0".parse::<ClassifierSignal>(), Ok(ClassifierSignal::Legitimate));
        assert_eq!(
            "yes".parse::<ClassifierSignal>(),
            Err(EvaluationError::InvalidClassifierSignal("yes".to_string()))
        );
        assert_eq!(
            "2".parse::<ClassifierSignal>(),
            Err(EvaluationError::InvalidClassifierSignal("2".to_string()))
        );
        assert!("0.5".parse::<ClassifierSignal>().is_err());
    }

    #[test]
    fn test_signal_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&ClassifierSignal::Fraudulent).unwrap(), "1");
        let signal: ClassifierSignal = serde_json::from_str("0").unwrap();
        assert_eq!(signal, ClassifierSignal::Legitimate);
    }

    #[test]
    fn test_triggered_rules_summary() {
        let empty = EvaluationResult {
            is_fraudulent: false,
            violations: Vec::new(),
        };
        assert_eq!(empty.triggered_rules_summary(), "None");
        assert!(!empty.rules_triggered());

        let result = EvaluationResult {
            is_fraudulent: true,
            violations: vec![
                RuleViolation::new(FraudRule::DistanceFromHome, "Distance from home > 50"),
                RuleViolation::new(FraudRule::PurchaseRatio, "Purchase ratio > 5.0"),
            ],
        };
        assert_eq!(
            result.triggered_rules_summary(),
            "Distance from home > 50; Purchase ratio > 5.0"
        );
    }

    #[test]
    fn test_verdict_record_columns() {
        let record = TransactionRecord {
            distance_from_home: 100.0,
            distance_from_last_transaction: 1.0,
            ratio_to_median_purchase_price: 1.0,
            repeat_retailer: true,
            used_chip: false,
            used_pin_number: false,
            online_order: false,
        };
        let result = EvaluationResult {
            is_fraudulent: true,
            violations: vec![RuleViolation::new(
                FraudRule::DistanceFromHome,
                "Distance from home > 50",
            )],
        };

        let row = VerdictRecord::new(&record, ClassifierSignal::Legitimate, &result);
        assert_eq!(row.repeat_retailer, 1);
        assert_eq!(row.used_chip, 0);
        assert_eq!(row.ml_prediction, 0);
        assert_eq!(row.rules_triggered, "Yes");
        assert_eq!(row.triggered_rules, "Distance from home > 50");
        assert_eq!(row.final_prediction, 1);
    }

    #[test]
    fn test_verdict_report_serialization() {
        let result = EvaluationResult {
            is_fraudulent: true,
            violations: vec![RuleViolation::new(
                FraudRule::OnlineNewRetailerWithoutChip,
                "Online order at new retailer without chip",
            )],
        };
        let report = VerdictReport::new("tx_123".to_string(), ClassifierSignal::Legitimate, result);

        let json = serde_json::to_string(&report).unwrap();
        let deserialized: VerdictReport = serde_json::from_str(&json).unwrap();

        assert_eq!(report.transaction_id, deserialized.transaction_id);
        assert_eq!(report.ml_prediction, deserialized.ml_prediction);
        assert_eq!(report.violations, deserialized.violations);
        assert!(json.contains("\"rule\":\"online_new_retailer_without_chip\""));
    }
}
