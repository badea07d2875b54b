/// Metadata that travels alongside a transcript and is echoed back verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionMeta {
    pub student_name: Option<String>,
    pub teacher_name: Option<String>,
    pub group_name: Option<String>,
}

/// A validated submission: the transcript is known to be present and non-empty.
#[derive(Debug, Clone)]
pub struct Submission {
    pub message: String,
    pub meta: SubmissionMeta,
}
