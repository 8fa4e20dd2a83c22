//! NATS publisher for verdict reports

use crate::types::verdict::VerdictReport;
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Producer for publishing verdicts to NATS
#[derive(Clone)]
pub struct VerdictProducer {
    client: Client,
    subject: String,
}

impl VerdictProducer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish one verdict report
    pub async fn publish(&self, report: &VerdictReport) -> Result<()> {
        let payload = serde_json::to_vec(report)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            report_id = %report.report_id,
            transaction_id = %report.transaction_id,
            is_fraudulent = report.is_fraudulent,
            "Published verdict"
        );

        Ok(())
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
