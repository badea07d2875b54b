use crate::config::HealthConfig;
use crate::services::sender::SenderFactory;
use opentelemetry::{KeyValue, global, metrics::Gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Clone, Debug)]
pub struct Metrics {
    pub status: Gauge<i64>,
}

impl Metrics {
    #[must_use]
    pub(crate) fn new() -> Self {
        let meter = global::meter("transcript-relay");
        Self {
            status: meter
                .i64_gauge("relay_health_status")
                .with_description("Status of health checks (1 for ok, 0 for error)")
                .build(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct HealthService {
    factory: Arc<dyn SenderFactory>,
    config: HealthConfig,
    metrics: Metrics,
}

impl HealthService {
    #[must_use]
    pub fn new(factory: Arc<dyn SenderFactory>, config: HealthConfig) -> Self {
        Self { factory, config, metrics: Metrics::new() }
    }

    /// Checks that the Bot API is reachable and accepts the bot token.
    ///
    /// # Errors
    /// Returns a string describing the failure if Telegram is unreachable or rejects the token.
    pub async fn check_telegram(&self) -> Result<(), String> {
        let probe_timeout = Duration::from_millis(self.config.timeout_ms);

        let result = match self.factory.connect() {
            Ok(sender) => match timeout(probe_timeout, sender.probe()).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(format!("Telegram check failed: {e}")),
                Err(_) => Err("Telegram check timed out".to_string()),
            },
            Err(e) => Err(format!("Telegram client unavailable: {e}")),
        };

        let value = i64::from(result.is_ok());
        self.metrics.status.record(value, &[KeyValue::new("component", "telegram")]);
        result
    }
}
