use std::{fmt, str::FromStr};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// The handle a [crate::JobBackend] hands back for a submitted job. In this
/// design it is always the job name the job was submitted under.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        JobId(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        JobId(value.to_string())
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A freshly generated, globally unique job name. Names are never reused,
/// not even for a retry of a failed submission.
pub fn generate_job_name() -> String {
    Uuid::new_v4().to_string()
}

/// Everything a [crate::JobBackend] needs to run one transcription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobSpec {
    /// Where the backend reads the staged media from
    pub source_locator: String,
    /// The object store namespace the backend writes its output to
    pub output_locator: String,
    pub job_name: String,
    /// For example `en-US`; when absent the backend identifies the language
    pub language_hint: Option<String>,
}

/// The state of a job as last observed on its backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Interpret a raw status value reported by a backend. Only `COMPLETED`
    /// and `FAILED` are terminal; anything else, including values this crate
    /// has never heard of, means the job is still running.
    pub fn from_backend(status: &str) -> Self {
        JobStatus::from_str(status.trim()).unwrap_or(JobStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}
