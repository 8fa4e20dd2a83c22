//! Error types for the evaluation core

use thiserror::Error;

/// A transaction record that does not satisfy the input schema.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("field `{field}` must be a finite, non-negative number, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },
}

/// A rule threshold outside its documented range.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("{name} = {value} is outside the valid range [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Contract violations detected while producing a verdict.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("classifier signal must be exactly 0 or 1, got {0}")]
    InvalidClassifierSignal(String),
}
