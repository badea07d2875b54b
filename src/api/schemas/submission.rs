use crate::domain::delivery::{DeliveryOutcome, PartResult};
use crate::domain::submission::{Submission, SubmissionMeta};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const DELIVERED_MESSAGE: &str = "Test submitted and sent to Telegram successfully";
pub const PARTIAL_FAILURE_ERROR: &str = "Some parts failed to send";
pub const FALLBACK_NOTE: &str =
    "Test was submitted locally but failed to send to Telegram. Please check bot configuration.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub message: Option<String>,
    pub student_name: Option<String>,
    pub teacher_name: Option<String>,
    pub group_name: Option<String>,
}

impl SubmissionRequest {
    /// Validates the submission payload.
    ///
    /// # Errors
    /// Returns an error if the transcript is missing or empty.
    pub fn validate(self) -> Result<Submission, String> {
        match self.message {
            Some(message) if !message.is_empty() => Ok(Submission {
                message,
                meta: SubmissionMeta {
                    student_name: self.student_name,
                    teacher_name: self.teacher_name,
                    group_name: self.group_name,
                },
            }),
            _ => Err("Message is required".into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PartResultDto {
    pub part: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<PartResult> for PartResultDto {
    fn from(result: PartResult) -> Self {
        Self { part: result.part, success: result.success(), error: result.error }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub message_parts: usize,
    pub results: Vec<PartResultDto>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    pub details: SubmissionDetails,
}

impl From<DeliveryOutcome> for SubmissionResponse {
    fn from(outcome: DeliveryOutcome) -> Self {
        let success = outcome.all_successful();
        let details = SubmissionDetails {
            student_name: outcome.meta.student_name,
            teacher_name: outcome.meta.teacher_name,
            group_name: outcome.meta.group_name,
            timestamp: outcome.timestamp,
            message_parts: outcome.message_parts,
            results: outcome.results.into_iter().map(PartResultDto::from).collect(),
        };

        if success {
            Self { success, message: Some(DELIVERED_MESSAGE), error: None, details }
        } else {
            Self { success, message: None, error: Some(PARTIAL_FAILURE_ERROR), details }
        }
    }
}

/// Body returned when the notification path broke but the submission itself is accepted.
#[derive(Debug, Serialize)]
pub struct SoftFailureResponse {
    pub success: bool,
    pub error: String,
    pub note: &'static str,
    pub fallback: bool,
}

impl SoftFailureResponse {
    #[must_use]
    pub const fn new(error: String) -> Self {
        Self { success: false, error, note: FALLBACK_NOTE, fallback: true }
    }
}
