use crate::config::{DeliveryConfig, TELEGRAM_MAX_MESSAGE_LENGTH};
use crate::domain::delivery::{DeliveryOutcome, PartResult};
use crate::domain::submission::Submission;
use crate::services::delivery::{DeliveryPolicy, deliver_parts};
use crate::services::segmenter::{Segmenter, SegmenterError};
use crate::services::sender::{SendError, SenderFactory};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Room kept free in every part for the `(Part i/n)` label, in UTF-16 code units.
pub const PART_LABEL_RESERVE: usize = 32;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("{0}")]
    Sender(#[from] SendError),
    #[error("Malformed submission: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug)]
struct Metrics {
    submissions_total: Counter<u64>,
    parts_sent_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("transcript-relay");
        Self {
            submissions_total: meter
                .u64_counter("relay_submissions_total")
                .with_description("Submissions processed, by outcome")
                .build(),
            parts_sent_total: meter
                .u64_counter("relay_parts_sent_total")
                .with_description("Message parts handed to Telegram, by status")
                .build(),
        }
    }

    fn record_parts(&self, results: &[PartResult]) {
        for result in results {
            let status = if result.success() { "success" } else { "failure" };
            self.parts_sent_total.add(1, &[KeyValue::new("status", status)]);
        }
    }
}

/// Runs the submission pipeline: segment, deliver part by part, aggregate.
#[derive(Clone, Debug)]
pub struct RelayService {
    factory: Arc<dyn SenderFactory>,
    segmenter: Segmenter,
    policy: DeliveryPolicy,
    metrics: Metrics,
}

impl RelayService {
    /// # Errors
    /// Returns `SegmenterError` if the configured part length does not fit a Telegram message,
    /// including the label reserve when labels are enabled.
    pub fn new(factory: Arc<dyn SenderFactory>, config: &DeliveryConfig) -> Result<Self, SegmenterError> {
        let transport_limit = if config.part_labels {
            TELEGRAM_MAX_MESSAGE_LENGTH - PART_LABEL_RESERVE
        } else {
            TELEGRAM_MAX_MESSAGE_LENGTH
        };
        let segmenter = Segmenter::new(config.max_part_length, config.newline_threshold_percent, transport_limit)?;
        let policy =
            DeliveryPolicy { pause: Duration::from_millis(config.part_pause_ms), label_parts: config.part_labels };

        Ok(Self { factory, segmenter, policy, metrics: Metrics::new() })
    }

    /// Delivers a validated submission and reports how every part fared.
    ///
    /// Per-part failures end up in the outcome, not in the error.
    ///
    /// # Errors
    /// Returns `RelayError::Sender` if no sender can be built for the destination.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self, submission),
        fields(
            submission_id = %Uuid::new_v4(),
            student = submission.meta.student_name.as_deref().unwrap_or_default(),
            teacher = submission.meta.teacher_name.as_deref().unwrap_or_default(),
            group = submission.meta.group_name.as_deref().unwrap_or_default(),
        )
    )]
    pub async fn submit(&self, submission: Submission) -> Result<DeliveryOutcome, RelayError> {
        let sender = self.factory.connect().inspect_err(|_| {
            self.metrics.submissions_total.add(1, &[KeyValue::new("outcome", "fallback")]);
        })?;

        let parts = self.segmenter.segment(&submission.message);
        tracing::info!(
            utf16_units = submission.message.encode_utf16().count(),
            parts = parts.len(),
            "Received submission"
        );

        let results = deliver_parts(sender.as_ref(), &parts, self.policy).await;
        self.metrics.record_parts(&results);

        let outcome = DeliveryOutcome::new(submission.meta, results);
        let all_successful = outcome.all_successful();
        self.metrics
            .submissions_total
            .add(1, &[KeyValue::new("outcome", if all_successful { "delivered" } else { "partial" })]);

        if all_successful {
            tracing::info!(parts = outcome.message_parts, "Submission relayed to Telegram");
        } else {
            let failed: Vec<usize> = outcome.failed_parts().map(|r| r.part).collect();
            tracing::warn!(parts = outcome.message_parts, failed = ?failed, "Submission partially relayed");
        }

        Ok(outcome)
    }
}
