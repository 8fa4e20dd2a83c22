//! Batch scoring tool
//!
//! Scores a CSV of transactions and writes the verdict columns next to the
//! input fields.
//!
//! ```text
//! batch-score --input transactions.csv --output verdicts.csv
//! batch-score --input transactions.csv --fixed-signal 0 --purchase-ratio-threshold 7.5
//! batch-score --write-sample test_transactions.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use transaction_risk_engine::{
    batch::{self, BatchSummary},
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    models::{Classifier, FixedClassifier, OnnxClassifier},
    ClassifierSignal,
};

#[derive(Parser, Debug)]
#[command(name = "batch-score", about = "Score a CSV of transactions for fraud")]
struct Args {
    /// CSV file with the seven transaction columns
    #[arg(short, long, required_unless_present = "write_sample")]
    input: Option<PathBuf>,

    /// Output CSV (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file for thresholds and the classifier model
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use a constant classifier prediction (0 or 1) instead of the model
    #[arg(long)]
    fixed_signal: Option<ClassifierSignal>,

    /// Override the distance-from-home threshold
    #[arg(long)]
    distance_home_threshold: Option<f64>,

    /// Override the distance-from-last-transaction threshold
    #[arg(long)]
    distance_last_tx_threshold: Option<f64>,

    /// Override the purchase ratio threshold
    #[arg(long)]
    purchase_ratio_threshold: Option<f64>,

    /// Write the example dataset to this path and exit
    #[arg(long)]
    write_sample: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Verdict CSV may go to stdout, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("batch_score=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    if let Some(path) = &args.write_sample {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        batch::write_records(BufWriter::new(file), &batch::sample_transactions())?;
        info!(path = %path.display(), "Sample transactions written");
        return Ok(());
    }

    let mut config = if args.config.exists() {
        AppConfig::load_from_path(&args.config)?
    } else {
        info!(path = %args.config.display(), "Config file not found, using defaults");
        AppConfig::default()
    };

    config.rules = config
        .rules
        .with_overrides(
            args.distance_home_threshold,
            args.distance_last_tx_threshold,
            args.purchase_ratio_threshold,
        )
        .context("Invalid threshold override")?;

    let classifier: Box<dyn Classifier> = match args.fixed_signal {
        Some(signal) => Box::new(FixedClassifier::new(signal)),
        None => Box::new(OnnxClassifier::new(&config.classifier)?),
    };

    let input = args
        .input
        .as_ref()
        .context("--input is required")?;
    let records = batch::read_records(input)?;
    info!(
        path = %input.display(),
        rows = records.len(),
        classifier = classifier.name(),
        "Transactions loaded"
    );

    let verdicts = batch::score_records(&records, classifier.as_ref(), &config.rules)?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            batch::write_verdicts(BufWriter::new(file), &verdicts)?;
            info!(path = %path.display(), "Verdicts written");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            batch::write_verdicts(&mut handle, &verdicts)?;
            handle.flush()?;
        }
    }

    let summary = BatchSummary::from_verdicts(&verdicts);
    info!(
        transactions = summary.transactions,
        ml_flagged = summary.ml_flagged,
        rules_flagged = summary.rules_flagged,
        total_flagged = summary.total_flagged,
        "Batch scored"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_signal_argument() {
        let args = Args::try_parse_from(["batch-score", "-i", "tx.csv", "--fixed-signal", "1"])
            .unwrap();
        assert_eq!(args.fixed_signal, Some(ClassifierSignal::Fraudulent));

        let err = Args::try_parse_from(["batch-score", "-i", "tx.csv", "--fixed-signal", "2"])
            .unwrap_err();
        assert!(err.to_string().contains("0 or 1"));
    }

    #[test]
    fn test_threshold_override_arguments() {
        let args = Args::try_parse_from([
            "batch-score",
            "-i",
            "tx.csv",
            "--distance-home-threshold",
            "5",
        ])
        .unwrap();
        let rules = AppConfig::default().rules.with_overrides(
            args.distance_home_threshold,
            args.distance_last_tx_threshold,
            args.purchase_ratio_threshold,
        );
        assert!(rules.is_err());
    }

    #[test]
    fn test_input_required_unless_writing_sample() {
        assert!(Args::try_parse_from(["batch-score"]).is_err());
        assert!(Args::try_parse_from(["batch-score", "--write-sample", "out.csv"]).is_ok());
    }
}
