//! Feature extraction for classifier inference.
//!
//! The classifier was trained on the raw transaction columns, so the
//! feature vector is the record itself in training column order.

use crate::types::transaction::{TransactionRecord, REQUIRED_COLUMNS};

/// Transforms transaction records into model input features.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract features from a record, ordered as in [`REQUIRED_COLUMNS`].
    pub fn extract(&self, record: &TransactionRecord) -> Vec<f32> {
        vec![
            record.distance_from_home as f32,
            record.distance_from_last_transaction as f32,
            record.ratio_to_median_purchase_price as f32,
            flag(record.repeat_retailer),
            flag(record.used_chip),
            flag(record.used_pin_number),
            flag(record.online_order),
        ]
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        REQUIRED_COLUMNS.len()
    }

    /// Get feature names in model input order.
    pub fn feature_names(&self) -> &'static [&'static str] {
        &REQUIRED_COLUMNS
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_extraction() {
        let extractor = FeatureExtractor::new();
        let record = TransactionRecord {
            distance_from_home: 100.0,
            distance_from_last_transaction: 50.0,
            ratio_to_median_purchase_price: 10.0,
            repeat_retailer: false,
            used_chip: true,
            used_pin_number: false,
            online_order: true,
        };

        let features = extractor.extract(&record);

        assert_eq!(features.len(), extractor.feature_count());
        assert_eq!(features, vec![100.0, 50.0, 10.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_feature_names_match_columns() {
        let extractor = FeatureExtractor::new();
        assert_eq!(extractor.feature_count(), 7);
        assert_eq!(extractor.feature_names()[0], "distance_from_home");
        assert_eq!(extractor.feature_names()[6], "online_order");
    }
}
