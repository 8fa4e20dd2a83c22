//! CSV batch scoring.
//!
//! Reads transaction rows, runs each through the classifier and the verdict
//! combiner, and writes one flat verdict row per input row.

use crate::error::SchemaError;
use crate::models::classifier::Classifier;
use crate::types::thresholds::RuleThresholds;
use crate::types::transaction::{TransactionRecord, REQUIRED_COLUMNS};
use crate::types::verdict::VerdictRecord;
use crate::verdict::combine;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// Flag counts over a scored batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub transactions: usize,
    pub ml_flagged: usize,
    pub rules_flagged: usize,
    pub total_flagged: usize,
}

impl BatchSummary {
    pub fn from_verdicts(verdicts: &[VerdictRecord]) -> Self {
        verdicts.iter().fold(Self::default(), |mut summary, row| {
            summary.transactions += 1;
            summary.ml_flagged += usize::from(row.ml_prediction == 1);
            summary.rules_flagged += usize::from(row.rules_triggered == "Yes");
            summary.total_flagged += usize::from(row.final_prediction == 1);
            summary
        })
    }
}

/// Column names from `headers` that the record schema requires but are absent
pub fn missing_columns(headers: &csv::StringRecord) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h.trim() == **required))
        .map(|c| c.to_string())
        .collect()
}

/// Read and validate transaction records from a CSV file
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<TransactionRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    read_records_from(file)
}

/// Read and validate transaction records from any CSV source.
///
/// Fails on the first malformed row; extra columns are ignored.
pub fn read_records_from<R: Read>(source: R) -> Result<Vec<TransactionRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let missing = missing_columns(&headers);
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing).into());
    }

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<TransactionRecord>().enumerate() {
        let record = row.with_context(|| format!("Failed to read row {}", idx + 1))?;
        record
            .validate()
            .with_context(|| format!("Invalid row {}", idx + 1))?;
        records.push(record);
    }

    Ok(records)
}

/// Classify and evaluate every record, preserving input order
pub fn score_records(
    records: &[TransactionRecord],
    classifier: &dyn Classifier,
    thresholds: &RuleThresholds,
) -> Result<Vec<VerdictRecord>> {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| -> Result<VerdictRecord> {
            let signal = classifier.predict(record).with_context(|| {
                format!("Classifier {} failed on row {}", classifier.name(), idx + 1)
            })?;
            let result = combine(record, thresholds, signal);

            debug!(
                row = idx + 1,
                ml_prediction = signal.as_u8(),
                violations = result.violations.len(),
                is_fraudulent = result.is_fraudulent,
                "Row evaluated"
            );

            Ok(VerdictRecord::new(record, signal, &result))
        })
        .collect()
}

/// Write verdict rows as CSV with a header line
pub fn write_verdicts<W: Write>(sink: W, verdicts: &[VerdictRecord]) -> Result<()> {
    write_rows(sink, verdicts)
}

/// Write records as CSV with a header line
pub fn write_records<W: Write>(sink: W, records: &[TransactionRecord]) -> Result<()> {
    write_rows(sink, records)
}

fn write_rows<W: Write, T: Serialize>(sink: W, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Example dataset: legitimate in-store purchases near home mixed with
/// distant, high-value online orders at new retailers.
pub fn sample_transactions() -> Vec<TransactionRecord> {
    const DISTANCE_FROM_HOME: [f64; 16] = [
        5.0, 10.0, 15.0, 100.0, 150.0, 200.0, 7.0, 12.0, 8.0, 20.0, 18.0, 120.0, 180.0, 250.0,
        300.0, 400.0,
    ];
    const DISTANCE_FROM_LAST: [f64; 16] = [
        0.5, 1.0, 1.5, 50.0, 75.0, 100.0, 0.7, 0.9, 1.2, 2.0, 1.8, 60.0, 90.0, 120.0, 150.0, 200.0,
    ];
    const PURCHASE_RATIO: [f64; 16] = [
        1.0, 1.2, 0.8, 10.0, 15.0, 20.0, 1.1, 0.9, 1.3, 1.0, 1.1, 12.0, 18.0, 25.0, 30.0, 40.0,
    ];
    const RISKY: [bool; 16] = [
        false, false, false, true, true, true, false, false, false, false, false, true, true, true,
        true, true,
    ];

    (0..16)
        .map(|i| TransactionRecord {
            distance_from_home: DISTANCE_FROM_HOME[i],
            distance_from_last_transaction: DISTANCE_FROM_LAST[i],
            ratio_to_median_purchase_price: PURCHASE_RATIO[i],
            repeat_retailer: !RISKY[i],
            used_chip: !RISKY[i],
            used_pin_number: !RISKY[i],
            online_order: RISKY[i],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classifier::FixedClassifier;
    use crate::types::verdict::ClassifierSignal;

    const HEADER: &str = "distance_from_home,distance_from_last_transaction,ratio_to_median_purchase_price,repeat_retailer,used_chip,used_pin_number,online_order";

    #[test]
    fn test_missing_columns_are_all_reported() {
        let csv = "distance_from_home,used_chip,online_order\n1,1,0\n";
        let err = read_records_from(csv.as_bytes()).unwrap_err();
        let schema = err.downcast_ref::<SchemaError>().unwrap();
        assert_eq!(
            schema,
            &SchemaError::MissingColumns(vec![
                "distance_from_last_transaction".to_string(),
                "ratio_to_median_purchase_price".to_string(),
                "repeat_retailer".to_string(),
                "used_pin_number".to_string(),
            ])
        );
    }

    #[test]
    fn test_extra_columns_and_column_order_are_tolerated() {
        let csv = "id,online_order,used_pin_number,used_chip,repeat_retailer,ratio_to_median_purchase_price,distance_from_last_transaction,distance_from_home\n\
                   a,1,0,0,0,10,50,100\n";
        let records = read_records_from(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].distance_from_home, 100.0);
        assert!(records[0].online_order);
        assert!(!records[0].repeat_retailer);
    }

    #[test]
    fn test_malformed_rows_fail_with_row_number() {
        let csv = format!("{}\n5,0.5,1,1,1,1,0\n5,0.5,abc,1,1,1,0\n", HEADER);
        let err = read_records_from(csv.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("row 2"));

        let csv = format!("{}\n5,0.5,1,1,1,1,3\n", HEADER);
        assert!(read_records_from(csv.as_bytes()).is_err());

        let csv = format!("{}\n-5,0.5,1,1,1,1,0\n", HEADER);
        let err = read_records_from(csv.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("distance_from_home"));
    }

    #[test]
    fn test_float_flags_are_accepted() {
        let csv = format!("{}\n5.0,0.5,1.0,1.0,1.0,0.0,0.0\n", HEADER);
        let records = read_records_from(csv.as_bytes()).unwrap();
        assert!(records[0].repeat_retailer);
        assert!(!records[0].used_pin_number);
    }

    #[test]
    fn test_sample_dataset_scoring() {
        let records = sample_transactions();
        assert_eq!(records.len(), 16);

        let classifier = FixedClassifier::new(ClassifierSignal::Legitimate);
        let verdicts =
            score_records(&records, &classifier, &RuleThresholds::default()).unwrap();
        let summary = BatchSummary::from_verdicts(&verdicts);

        // Rows 4-6 and 12-16 trip every rule
        assert_eq!(
            summary,
            BatchSummary {
                transactions: 16,
                ml_flagged: 0,
                rules_flagged: 8,
                total_flagged: 8,
            }
        );
        assert_eq!(verdicts[0].triggered_rules, "None");
        assert_eq!(verdicts[3].triggered_rules.split("; ").count(), 4);
    }

    #[test]
    fn test_classifier_positive_flags_every_row() {
        let records = sample_transactions();
        let classifier = FixedClassifier::new(ClassifierSignal::Fraudulent);
        let verdicts =
            score_records(&records, &classifier, &RuleThresholds::default()).unwrap();
        let summary = BatchSummary::from_verdicts(&verdicts);
        assert_eq!(summary.ml_flagged, 16);
        assert_eq!(summary.total_flagged, 16);
        assert_eq!(summary.rules_flagged, 8);
    }

    #[test]
    fn test_written_verdicts_have_flat_columns() {
        let records = &sample_transactions()[..1];
        let classifier = FixedClassifier::new(ClassifierSignal::Legitimate);
        let verdicts = score_records(records, &classifier, &RuleThresholds::default()).unwrap();

        let mut out = Vec::new();
        write_verdicts(&mut out, &verdicts).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            format!(
                "{},ml_prediction,rules_triggered,triggered_rules,final_prediction",
                HEADER
            )
        );
        assert_eq!(lines.next().unwrap(), "5.0,0.5,1.0,1,1,1,0,0,No,None,0");
    }

    #[test]
    fn test_sample_csv_reads_back() {
        let mut out = Vec::new();
        write_records(&mut out, &sample_transactions()).unwrap();
        let records = read_records_from(out.as_slice()).unwrap();
        assert_eq!(records, sample_transactions());
    }
}
