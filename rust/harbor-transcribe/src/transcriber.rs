use anyhow::anyhow;
use bytes::Bytes;
use harbor_storage::ObjectStore;
use std::path::Path;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    generate_job_name, JobBackend, JobId, JobSpec, JobStatus, TranscribeConfig, TranscribeError,
};

/// What became of a request to retrieve a transcript
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranscriptOutcome {
    /// The transcriber is not configured, so nothing was attempted
    Unavailable,
    /// The backend reported that the job failed
    Failed { job_id: JobId },
    /// The job finished and its output was read back from storage
    Completed { job_id: JobId, payload: Bytes },
}

impl TranscriptOutcome {
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            TranscriptOutcome::Unavailable => None,
            TranscriptOutcome::Failed { job_id } | TranscriptOutcome::Completed { job_id, .. } => {
                Some(job_id)
            }
        }
    }

    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            TranscriptOutcome::Completed { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn into_payload(self) -> Option<Bytes> {
        match self {
            TranscriptOutcome::Completed { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// The payload of a completed job, decoded as (lossy) UTF-8
    pub fn text(&self) -> Option<String> {
        self.payload()
            .map(|payload| String::from_utf8_lossy(payload).into_owned())
    }
}

/// Stages media in an [ObjectStore], runs transcription jobs for it on a
/// [JobBackend] and collects their output.
///
/// Every operation first consults the availability gate over the configured
/// [crate::Credentials]. When the gate is closed, operations return `None`
/// or [TranscriptOutcome::Unavailable] without touching the store or the
/// backend.
///
/// A [Transcriber] holds no per-job state, so a single instance may be shared
/// by any number of concurrent callers.
#[derive(Debug)]
pub struct Transcriber<S, B>
where
    S: ObjectStore,
    B: JobBackend,
{
    config: TranscribeConfig,
    store: S,
    backend: B,
}

impl<S, B> Transcriber<S, B>
where
    S: ObjectStore,
    B: JobBackend,
{
    pub fn new(config: TranscribeConfig, store: S, backend: B) -> Self {
        Transcriber {
            config,
            store,
            backend,
        }
    }

    pub fn config(&self) -> &TranscribeConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_available(&self) -> bool {
        self.config.credentials.is_available()
    }

    /// The configured bucket, if and only if the gate is open
    fn bucket(&self) -> Option<&str> {
        if self.is_available() {
            self.config.credentials.bucket.as_deref()
        } else {
            None
        }
    }

    /// Stage the file at `path` and submit a job for it, returning as soon as
    /// the backend has accepted the job. Returns `Ok(None)` when the
    /// transcriber is not configured.
    ///
    /// If staging fails, no job is submitted.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn transcribe(
        &self,
        path: &Path,
        language_hint: Option<&str>,
    ) -> Result<Option<JobId>, TranscribeError> {
        let bucket = match self.bucket() {
            Some(bucket) => bucket,
            None => {
                debug!("Transcriber is not configured; skipping submission");
                return Ok(None);
            }
        };

        let job_name = generate_job_name();

        self.store
            .put_file(bucket, &job_name, path)
            .await
            .map_err(|error| TranscribeError::Upload {
                path: path.to_path_buf(),
                error,
            })?;

        let source_locator = self
            .store
            .url_for(bucket, &job_name)
            .map_err(|error| TranscribeError::Upload {
                path: path.to_path_buf(),
                error,
            })?;

        trace!("Staged media at {}", source_locator);

        let spec = JobSpec {
            source_locator: source_locator.to_string(),
            output_locator: bucket.to_string(),
            job_name,
            language_hint: language_hint.map(|hint| hint.to_string()),
        };

        let job_id = self
            .backend
            .submit(&spec)
            .await
            .map_err(TranscribeError::Backend)?;

        if job_id.as_str() != spec.job_name {
            return Err(TranscribeError::Backend(anyhow!(
                "Job submitted as {} was acknowledged as {}",
                spec.job_name,
                job_id
            )));
        }

        debug!("Submitted transcription job {}", job_id);

        Ok(Some(job_id))
    }

    /// Submit a job for the file at `path` and wait for its outcome.
    pub async fn transcribe_and_wait(
        &self,
        path: &Path,
        language_hint: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<TranscriptOutcome, TranscribeError> {
        match self.transcribe(path, language_hint).await? {
            Some(job_id) => self.get_result(&job_id, cancel).await,
            None => Ok(TranscriptOutcome::Unavailable),
        }
    }

    /// Wait for a previously submitted job to finish and read back its
    /// output. This may be called any number of times for the same job; each
    /// call polls the backend again but never resubmits anything.
    #[instrument(skip(self, cancel))]
    pub async fn get_result(
        &self,
        job_id: &JobId,
        cancel: &CancellationToken,
    ) -> Result<TranscriptOutcome, TranscribeError> {
        let bucket = match self.bucket() {
            Some(bucket) => bucket,
            None => {
                debug!("Transcriber is not configured; not polling");
                return Ok(TranscriptOutcome::Unavailable);
            }
        };

        match self.poll_until_terminal(job_id, cancel).await? {
            Finished::Completed => {
                let object = self
                    .store
                    .get(bucket, job_id.as_str())
                    .await
                    .map_err(|error| TranscribeError::Storage {
                        job_id: job_id.clone(),
                        error,
                    })?
                    .ok_or_else(|| TranscribeError::MissingOutput(job_id.clone()))?;

                debug!(
                    "Read {} bytes of output for job {}",
                    object.content_length(),
                    job_id
                );

                Ok(TranscriptOutcome::Completed {
                    job_id: job_id.clone(),
                    payload: object.bytes,
                })
            }
            Finished::Failed => {
                warn!("Transcription job {} failed", job_id);
                Ok(TranscriptOutcome::Failed {
                    job_id: job_id.clone(),
                })
            }
        }
    }

    /// Poll the backend for the status of a job until it finishes, backing
    /// off between checks as the configured [crate::PollPolicy] prescribes.
    /// Callers check the availability gate first.
    ///
    /// Gives up with [TranscribeError::Timeout] once the policy's timeout has
    /// elapsed, and with [TranscribeError::Cancelled] as soon as `cancel`
    /// fires.
    async fn poll_until_terminal(
        &self,
        job_id: &JobId,
        cancel: &CancellationToken,
    ) -> Result<Finished, TranscribeError> {
        let policy = &self.config.poll;
        let deadline = Instant::now().checked_add(policy.timeout);
        let mut backoff = policy.backoff();
        let mut checks = 0usize;

        let timed_out = || TranscribeError::Timeout {
            job_id: job_id.clone(),
            timeout: policy.timeout,
        };
        let cancelled = || TranscribeError::Cancelled(job_id.clone());

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled());
            }

            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = until(deadline) => return Err(timed_out()),
                status = self.backend.status(job_id) => status.map_err(TranscribeError::Backend)?,
            };

            checks += 1;

            let finished = match status {
                JobStatus::Completed => Some(Finished::Completed),
                JobStatus::Failed => Some(Finished::Failed),
                JobStatus::Running => None,
            };

            if let Some(finished) = finished {
                debug!("Job {} is {} after {} checks", job_id, status, checks);
                return Ok(finished);
            }

            let delay = backoff.next().unwrap_or(policy.max_interval);

            trace!("Job {} is {}; checking again in {:?}", job_id, status, delay);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = until(deadline) => return Err(timed_out()),
                _ = sleep(delay) => (),
            }
        }
    }
}

/// The statuses polling stops at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Finished {
    Completed,
    Failed,
}

/// Resolves at `deadline`, or never when there is none
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
