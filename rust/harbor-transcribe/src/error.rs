use std::{path::PathBuf, time::Duration};
use thiserror::Error;

use crate::JobId;

/// Things that can actually go wrong while transcribing. Missing
/// configuration is not among them (it yields an "unavailable" value), and
/// neither is a job that the backend reports as failed.
#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("Could not stage {} for transcription: {error}", path.display())]
    Upload { path: PathBuf, error: anyhow::Error },

    #[error("Job backend rejected the request: {0}")]
    Backend(anyhow::Error),

    #[error("Transcription job {job_id} did not finish within {timeout:?}")]
    Timeout { job_id: JobId, timeout: Duration },

    #[error("Stopped waiting for transcription job {0}")]
    Cancelled(JobId),

    #[error("Could not read the output of transcription job {job_id}: {error}")]
    Storage { job_id: JobId, error: anyhow::Error },

    #[error("Transcription job {0} completed but left no output")]
    MissingOutput(JobId),
}
