use crate::domain::delivery::{MessagePart, PartResult};
use crate::services::sender::MessageSender;
use std::time::Duration;
use tracing::Instrument;

#[derive(Debug, Clone, Copy)]
pub struct DeliveryPolicy {
    /// Wait between consecutive sends.
    pub pause: Duration,
    pub label_parts: bool,
}

/// Sends every part in order and records one result per part.
///
/// A failed part is recorded and the loop moves on; nothing is retried. Sends never
/// overlap, and consecutive sends are separated by `policy.pause`.
pub async fn deliver_parts(
    sender: &dyn MessageSender,
    parts: &[MessagePart<'_>],
    policy: DeliveryPolicy,
) -> Vec<PartResult> {
    let mut results = Vec::with_capacity(parts.len());

    for part in parts {
        let text = part.labelled_text(policy.label_parts);
        let span = tracing::debug_span!("deliver_part", part = part.index, total = part.total, chars = part.text.chars().count());

        let result = match sender.send_text(&text).instrument(span).await {
            Ok(()) => {
                tracing::info!(part = part.index, total = part.total, "Message part sent");
                PartResult::delivered(part.index)
            }
            Err(e) => {
                tracing::error!(error = %e, part = part.index, total = part.total, "Failed to send message part");
                PartResult::failed(part.index, e.to_string())
            }
        };
        results.push(result);

        if !part.is_last() && !policy.pause.is_zero() {
            tokio::time::sleep(policy.pause).await;
        }
    }

    results
}
