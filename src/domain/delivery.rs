use crate::domain::submission::SubmissionMeta;
use time::OffsetDateTime;

/// A contiguous slice of the submitted message, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagePart<'a> {
    pub index: usize,
    pub total: usize,
    pub text: &'a str,
}

impl MessagePart<'_> {
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.index == self.total
    }

    /// Text as it goes on the wire, with a `(Part i/n)` line when the message was split.
    #[must_use]
    pub fn labelled_text(&self, with_label: bool) -> String {
        if with_label && self.total > 1 {
            format!("{}\n\n(Part {}/{})", self.text, self.index, self.total)
        } else {
            self.text.to_owned()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartResult {
    pub part: usize,
    pub error: Option<String>,
}

impl PartResult {
    #[must_use]
    pub const fn delivered(part: usize) -> Self {
        Self { part, error: None }
    }

    #[must_use]
    pub const fn failed(part: usize, error: String) -> Self {
        Self { part, error: Some(error) }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Final verdict of one submission, built once after every part was attempted.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub meta: SubmissionMeta,
    pub message_parts: usize,
    pub results: Vec<PartResult>,
    pub timestamp: OffsetDateTime,
}

impl DeliveryOutcome {
    #[must_use]
    pub fn new(meta: SubmissionMeta, results: Vec<PartResult>) -> Self {
        Self { meta, message_parts: results.len(), results, timestamp: OffsetDateTime::now_utc() }
    }

    #[must_use]
    pub fn all_successful(&self) -> bool {
        self.results.iter().all(PartResult::success)
    }

    pub fn failed_parts(&self) -> impl Iterator<Item = &PartResult> {
        self.results.iter().filter(|r| !r.success())
    }
}
