//! Test Transaction Producer
//!
//! Publishes generated transactions to NATS for exercising the risk engine.
//!
//! Positional arguments: `[nats_url] [subject] [count] [fraud_rate] [delay_ms]`

use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};
use transaction_risk_engine::types::{TransactionMessage, TransactionRecord};

/// Transaction generator for testing
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
    transaction_counter: u64,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            transaction_counter: 0,
        }
    }

    fn next_id(&mut self) -> String {
        self.transaction_counter += 1;
        format!("tx_{:012}", self.transaction_counter)
    }

    /// In-store purchase close to home at a known retailer
    fn generate_legitimate(&mut self) -> TransactionMessage {
        let record = TransactionRecord {
            distance_from_home: self.rng.gen_range(0.5..30.0),
            distance_from_last_transaction: self.rng.gen_range(0.1..5.0),
            ratio_to_median_purchase_price: self.rng.gen_range(0.3..2.0),
            repeat_retailer: self.rng.gen_bool(0.9),
            used_chip: self.rng.gen_bool(0.7),
            used_pin_number: self.rng.gen_bool(0.4),
            online_order: self.rng.gen_bool(0.3),
        };

        TransactionMessage {
            transaction_id: self.next_id(),
            record,
        }
    }

    /// Far from home, unusually large, online at a new retailer without chip
    fn generate_suspicious(&mut self) -> TransactionMessage {
        let record = TransactionRecord {
            distance_from_home: self.rng.gen_range(60.0..500.0),
            distance_from_last_transaction: self.rng.gen_range(25.0..250.0),
            ratio_to_median_purchase_price: self.rng.gen_range(4.0..40.0),
            repeat_retailer: false,
            used_chip: false,
            used_pin_number: false,
            online_order: true,
        };

        TransactionMessage {
            transaction_id: self.next_id(),
            record,
        }
    }

    fn generate(&mut self, fraud_rate: f64) -> (TransactionMessage, bool) {
        if self.rng.gen_bool(fraud_rate) {
            (self.generate_suspicious(), true)
        } else {
            (self.generate_legitimate(), false)
        }
    }
}

const DEFAULT_FRAUD_RATE: f64 = 0.1;

/// Fraction of suspicious transactions, clamped to [0, 1]
fn parse_fraud_rate(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.parse::<f64>().ok())
        .filter(|rate| rate.is_finite())
        .unwrap_or(DEFAULT_FRAUD_RATE)
        .clamp(0.0, 1.0)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("transactions");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate = parse_fraud_rate(args.get(4).map(|s| s.as_str()));
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Starting test producer"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS, running in dry-run mode");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    };

    let mut generator = TransactionGenerator::new();
    let mut suspicious_count = 0;

    for i in 0..count {
        let (message, suspicious) = generator.generate(fraud_rate);
        if suspicious {
            suspicious_count += 1;
        }

        let payload = serde_json::to_vec(&message)?;
        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                published = i + 1,
                total = count,
                suspicious = suspicious_count,
                "Publishing transactions"
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;
    info!(
        published = count,
        suspicious = suspicious_count,
        "Completed"
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    let mut generator = TransactionGenerator::new();

    for i in 0..count {
        let (message, _) = generator.generate(fraud_rate);

        if (i + 1) % 10 == 0 || i == 0 {
            let json = serde_json::to_string_pretty(&message)?;
            info!("Sample transaction {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
