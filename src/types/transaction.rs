//! Transaction record evaluated by the rule engine and the classifier

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};

/// Column names every transaction source must provide, in model feature order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "distance_from_home",
    "distance_from_last_transaction",
    "ratio_to_median_purchase_price",
    "repeat_retailer",
    "used_chip",
    "used_pin_number",
    "online_order",
];

/// A single card transaction, described by the seven model features.
///
/// Binary fields are `bool` in memory and `0`/`1` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Distance between the transaction and the cardholder's home
    pub distance_from_home: f64,

    /// Distance from the previous transaction
    pub distance_from_last_transaction: f64,

    /// Purchase price relative to the cardholder's median purchase price
    pub ratio_to_median_purchase_price: f64,

    /// Cardholder has bought from this retailer before
    #[serde(with = "binary_flag")]
    pub repeat_retailer: bool,

    /// Card chip was used
    #[serde(with = "binary_flag")]
    pub used_chip: bool,

    /// PIN was entered
    #[serde(with = "binary_flag")]
    pub used_pin_number: bool,

    /// Card-not-present online order
    #[serde(with = "binary_flag")]
    pub online_order: bool,
}

impl TransactionRecord {
    /// Reject negative, NaN or infinite amounts.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let amounts = [
            ("distance_from_home", self.distance_from_home),
            (
                "distance_from_last_transaction",
                self.distance_from_last_transaction,
            ),
            (
                "ratio_to_median_purchase_price",
                self.ratio_to_median_purchase_price,
            ),
        ];

        for (field, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(SchemaError::InvalidAmount { field, value });
            }
        }

        Ok(())
    }
}

/// Envelope for records arriving on the message bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionMessage {
    /// Caller-assigned identifier, generated when absent
    #[serde(default = "generate_transaction_id")]
    pub transaction_id: String,

    #[serde(flatten)]
    pub record: TransactionRecord,
}

fn generate_transaction_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Serde adapter for 0/1 flags. Accepts integers, `0.0`/`1.0`, booleans
/// and their string forms; anything else is a decode error.
mod binary_flag {
    use serde::de::{self, Unexpected, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*flag))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(FlagVisitor)
    }

    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a binary flag (0 or 1)")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Signed(v), &self)),
            }
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Unsigned(v), &self)),
            }
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<bool, E> {
            if v == 0.0 {
                Ok(false)
            } else if v == 1.0 {
                Ok(true)
            } else {
                Err(E::invalid_value(Unexpected::Float(v), &self))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            match v.trim() {
                "0" | "0.0" | "false" | "False" => Ok(false),
                "1" | "1.0" | "true" | "True" => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
            }
        }
    }
}
