//! Threshold and pattern rules applied to a single transaction.
//!
//! Every rule is checked against the same record on each call, in a fixed
//! order, so the output ordering is stable. Threshold comparisons are strict:
//! a value exactly at the threshold never fires.

use crate::types::thresholds::RuleThresholds;
use crate::types::transaction::TransactionRecord;
use crate::types::verdict::{FraudRule, RuleViolation};

pub const ONLINE_NEW_RETAILER_WITHOUT_CHIP: &str = "Online order at new retailer without chip";

/// Evaluate all fraud rules and return the ones that fired.
pub fn evaluate_rules(
    record: &TransactionRecord,
    thresholds: &RuleThresholds,
) -> Vec<RuleViolation> {
    let mut violations = Vec::with_capacity(FraudRule::ALL.len());

    if record.distance_from_home > thresholds.distance_home_threshold {
        violations.push(RuleViolation::new(
            FraudRule::DistanceFromHome,
            format!(
                "Distance from home > {}",
                thresholds.distance_home_threshold
            ),
        ));
    }

    if record.distance_from_last_transaction > thresholds.distance_last_tx_threshold {
        violations.push(RuleViolation::new(
            FraudRule::DistanceFromLastTransaction,
            format!(
                "Distance from last transaction > {}",
                thresholds.distance_last_tx_threshold
            ),
        ));
    }

    // Ratio keeps its decimal point: "5.0", "5.5"
    if record.ratio_to_median_purchase_price > thresholds.purchase_ratio_threshold {
        violations.push(RuleViolation::new(
            FraudRule::PurchaseRatio,
            format!(
                "Purchase ratio > {:?}",
                thresholds.purchase_ratio_threshold
            ),
        ));
    }

    if record.online_order && !record.repeat_retailer && !record.used_chip {
        violations.push(RuleViolation::new(
            FraudRule::OnlineNewRetailerWithoutChip,
            ONLINE_NEW_RETAILER_WITHOUT_CHIP,
        ));
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_record() -> TransactionRecord {
        TransactionRecord {
            distance_from_home: 5.0,
            distance_from_last_transaction: 0.5,
            ratio_to_median_purchase_price: 1.0,
            repeat_retailer: true,
            used_chip: true,
            used_pin_number: true,
            online_order: false,
        }
    }

    fn risky_record() -> TransactionRecord {
        TransactionRecord {
            distance_from_home: 100.0,
            distance_from_last_transaction: 50.0,
            ratio_to_median_purchase_price: 10.0,
            repeat_retailer: false,
            used_chip: false,
            used_pin_number: false,
            online_order: true,
        }
    }

    fn rules_of(violations: &[RuleViolation]) -> Vec<FraudRule> {
        violations.iter().map(|v| v.rule).collect()
    }

    #[test]
    fn test_clean_record_triggers_nothing() {
        let violations = evaluate_rules(&clean_record(), &RuleThresholds::default());
        assert!(violations.is_empty());
    }

    #[test]
    fn test_all_rules_fire_in_order() {
        let violations = evaluate_rules(&risky_record(), &RuleThresholds::default());
        assert_eq!(rules_of(&violations), FraudRule::ALL.to_vec());

        let descriptions: Vec<&str> = violations.iter().map(RuleViolation::as_str).collect();
        assert_eq!(
            descriptions,
            vec![
                "Distance from home > 50",
                "Distance from last transaction > 20",
                "Purchase ratio > 5.0",
                "Online order at new retailer without chip",
            ]
        );
    }

    #[test]
    fn test_descriptions_reflect_custom_thresholds() {
        let thresholds = RuleThresholds {
            distance_home_threshold: 75.0,
            distance_last_tx_threshold: 10.0,
            purchase_ratio_threshold: 7.5,
        };
        let violations = evaluate_rules(&risky_record(), &thresholds);
        assert_eq!(violations[0].as_str(), "Distance from home > 75");
        assert_eq!(violations[1].as_str(), "Distance from last transaction > 10");
        assert_eq!(violations[2].as_str(), "Purchase ratio > 7.5");
    }

    #[test]
    fn test_threshold_boundary_is_strict() {
        let thresholds = RuleThresholds::default();

        let mut record = clean_record();
        record.distance_from_home = 50.0;
        assert!(evaluate_rules(&record, &thresholds).is_empty());

        record.distance_from_home = 50.01;
        assert_eq!(
            rules_of(&evaluate_rules(&record, &thresholds)),
            vec![FraudRule::DistanceFromHome]
        );

        record.distance_from_home = 51.0;
        assert_eq!(evaluate_rules(&record, &thresholds).len(), 1);

        let mut record = clean_record();
        record.distance_from_last_transaction = 20.0;
        record.ratio_to_median_purchase_price = 5.0;
        assert!(evaluate_rules(&record, &thresholds).is_empty());
    }

    #[test]
    fn test_rules_are_independent() {
        let thresholds = RuleThresholds::default();

        let mut record = clean_record();
        record.distance_from_home = 60.0;
        record.ratio_to_median_purchase_price = 6.0;
        assert_eq!(
            rules_of(&evaluate_rules(&record, &thresholds)),
            vec![FraudRule::DistanceFromHome, FraudRule::PurchaseRatio]
        );

        let mut record = clean_record();
        record.distance_from_last_transaction = 21.0;
        assert_eq!(
            rules_of(&evaluate_rules(&record, &thresholds)),
            vec![FraudRule::DistanceFromLastTransaction]
        );
    }

    #[test]
    fn test_online_pattern_needs_all_three_conditions() {
        let thresholds = RuleThresholds::default();
        let base = TransactionRecord {
            online_order: true,
            repeat_retailer: false,
            used_chip: false,
            ..clean_record()
        };
        assert_eq!(
            rules_of(&evaluate_rules(&base, &thresholds)),
            vec![FraudRule::OnlineNewRetailerWithoutChip]
        );

        let in_store = TransactionRecord {
            online_order: false,
            ..base
        };
        let repeat = TransactionRecord {
            repeat_retailer: true,
            ..base
        };
        let chip = TransactionRecord {
            used_chip: true,
            ..base
        };
        for record in [in_store, repeat, chip] {
            assert!(evaluate_rules(&record, &thresholds).is_empty());
        }

        // PIN usage plays no part in the pattern
        let pin = TransactionRecord {
            used_pin_number: true,
            ..base
        };
        assert_eq!(evaluate_rules(&pin, &thresholds).len(), 1);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let thresholds = RuleThresholds::default();
        let record = risky_record();
        let first = evaluate_rules(&record, &thresholds);
        let second = evaluate_rules(&record, &thresholds);
        assert_eq!(first, second);
    }
}
