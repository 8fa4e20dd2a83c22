//! Classifier capability consumed by the verdict pipeline

use crate::types::transaction::TransactionRecord;
use crate::types::verdict::ClassifierSignal;
use anyhow::Result;

/// Anything that can label a transaction as fraudulent or legitimate.
///
/// The pipeline only needs the binary prediction; how it is produced
/// (tree ensemble, neural network, remote service) stays behind this trait.
pub trait Classifier: Send + Sync {
    /// Predict the label for one record.
    fn predict(&self, record: &TransactionRecord) -> Result<ClassifierSignal>;

    /// Short model name for logs.
    fn name(&self) -> &str;
}

/// Classifier that returns the same label for every record.
///
/// Used to exercise the rule path on its own, or when no model file is
/// available.
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier {
    signal: ClassifierSignal,
}

impl FixedClassifier {
    pub fn new(signal: ClassifierSignal) -> Self {
        Self { signal }
    }
}

impl Classifier for FixedClassifier {
    fn predict(&self, _record: &TransactionRecord) -> Result<ClassifierSignal> {
        Ok(self.signal)
    }

    fn name(&self) -> &str {
        match self.signal {
            ClassifierSignal::Legitimate => "fixed-legitimate",
            ClassifierSignal::Fraudulent => "fixed-fraudulent",
        }
    }
}
