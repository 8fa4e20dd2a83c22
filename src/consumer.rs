//! NATS subscription for incoming transactions

use crate::types::transaction::TransactionMessage;
use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use tracing::info;

/// Consumer for transaction messages
pub struct TransactionConsumer {
    client: Client,
    subject: String,
}

impl TransactionConsumer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the transaction subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed to transaction subject");
        Ok(subscriber)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Decode and validate a transaction message payload
pub fn decode_message(payload: &[u8]) -> Result<TransactionMessage> {
    let message: TransactionMessage =
        serde_json::from_slice(payload).context("Malformed transaction payload")?;
    message
        .record
        .validate()
        .with_context(|| format!("Invalid transaction {}", message.transaction_id))?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_message() {
        let payload = br#"{"transaction_id": "tx_9", "distance_from_home": 100,
            "distance_from_last_transaction": 50, "ratio_to_median_purchase_price": 10,
            "repeat_retailer": 0, "used_chip": 0, "used_pin_number": 0, "online_order": 1}"#;
        let message = decode_message(payload).unwrap();
        assert_eq!(message.transaction_id, "tx_9");
        assert!(message.record.online_order);
    }

    #[test]
    fn test_decode_rejects_missing_field_and_negative_amount() {
        let missing = br#"{"transaction_id": "tx_1", "distance_from_home": 1}"#;
        assert!(decode_message(missing).is_err());

        let negative = br#"{"transaction_id": "tx_2", "distance_from_home": -3,
            "distance_from_last_transaction": 1, "ratio_to_median_purchase_price": 1,
            "repeat_retailer": 1, "used_chip": 1, "used_pin_number": 1, "online_order": 0}"#;
        let err = decode_message(negative).unwrap_err();
        assert!(format!("{:#}", err).contains("tx_2"));
    }
}
