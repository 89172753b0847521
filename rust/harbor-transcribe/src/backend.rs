use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;

use crate::{JobId, JobSpec, JobStatus};

/// A generic interface for a service that runs long-lived transcription
/// jobs. Implementations are shared by reference across concurrent callers,
/// so they must be [Send] + [Sync].
#[async_trait]
pub trait JobBackend: Send + Sync + Debug {
    /// Start a job. The returned [JobId] is the job name from `spec`.
    async fn submit(&self, spec: &JobSpec) -> Result<JobId>;

    /// The status of a job exactly as the backend reports it
    async fn raw_status(&self, job_id: &JobId) -> Result<String>;

    /// The status of a job, with unrecognized values treated as
    /// [JobStatus::Running]
    async fn status(&self, job_id: &JobId) -> Result<JobStatus> {
        Ok(JobStatus::from_backend(&self.raw_status(job_id).await?))
    }
}
