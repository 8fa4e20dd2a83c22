//! Tunable thresholds for the fraud rules

use crate::error::ThresholdError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const DISTANCE_HOME_RANGE: RangeInclusive<f64> = 10.0..=200.0;
pub const DISTANCE_LAST_TX_RANGE: RangeInclusive<f64> = 5.0..=100.0;
pub const PURCHASE_RATIO_RANGE: RangeInclusive<f64> = 2.0..=20.0;

/// Configurable rule thresholds.
///
/// The engine accepts any numeric value; range checks belong to whoever
/// builds the configuration (see [`RuleThresholds::validate`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// Miles from home above which a transaction is suspicious
    pub distance_home_threshold: f64,
    /// Distance from the previous transaction above which it is suspicious
    pub distance_last_tx_threshold: f64,
    /// Ratio to the median purchase price above which it is suspicious
    pub purchase_ratio_threshold: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            distance_home_threshold: 50.0,
            distance_last_tx_threshold: 20.0,
            purchase_ratio_threshold: 5.0,
        }
    }
}

impl RuleThresholds {
    /// Replace the given thresholds and validate the result.
    pub fn with_overrides(
        mut self,
        distance_home: Option<f64>,
        distance_last_tx: Option<f64>,
        purchase_ratio: Option<f64>,
    ) -> Result<Self, ThresholdError> {
        if let Some(value) = distance_home {
            self.distance_home_threshold = value;
        }
        if let Some(value) = distance_last_tx {
            self.distance_last_tx_threshold = value;
        }
        if let Some(value) = purchase_ratio {
            self.purchase_ratio_threshold = value;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check every threshold against its documented range.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        check_range(
            "distance_home_threshold",
            self.distance_home_threshold,
            DISTANCE_HOME_RANGE,
        )?;
        check_range(
            "distance_last_tx_threshold",
            self.distance_last_tx_threshold,
            DISTANCE_LAST_TX_RANGE,
        )?;
        check_range(
            "purchase_ratio_threshold",
            self.purchase_ratio_threshold,
            PURCHASE_RATIO_RANGE,
        )
    }
}

fn check_range(
    name: &'static str,
    value: f64,
    range: RangeInclusive<f64>,
) -> Result<(), ThresholdError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ThresholdError::OutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}
