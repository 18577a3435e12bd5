use anyhow::{Context, Result};
use wxpipe_core::WeatherReport;

/// Stand-in for a message-queue producer. Reports are serialized exactly as
/// they would be sent, but nothing leaves the process yet.
#[derive(Debug, Clone)]
pub struct KafkaPublisher {
    broker: String,
    topic: String,
}

impl KafkaPublisher {
    pub fn new(broker: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            broker: broker.into(),
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the payload size that would have been produced.
    pub fn publish(&self, report: &WeatherReport) -> Result<usize> {
        let payload = serde_json::to_vec(report)
            .with_context(|| format!("Failed to serialize report for {}", report.location_id))?;

        tracing::debug!(
            zip = %report.location_id,
            broker = %self.broker,
            topic = %self.topic,
            bytes = payload.len(),
            "would publish report"
        );
        tracing::warn!(
            "Kafka integration not implemented - data for {} would be sent to {}",
            report.location_id,
            self.topic
        );

        Ok(payload.len())
    }
}
