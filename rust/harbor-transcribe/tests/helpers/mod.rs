#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use harbor_storage::{MemoryObjectStore, ObjectStore};
use harbor_transcribe::{
    Credentials, JobBackend, JobId, JobSpec, PollPolicy, TranscribeConfig, MIN_POLL_INTERVAL,
};
use std::{collections::VecDeque, path::PathBuf, sync::Arc, time::Duration};
use tempfile::TempDir;
use tokio::sync::Mutex;

pub const BUCKET: &str = "bucket1";

/// A configuration that opens the availability gate and polls quickly
pub fn available_config() -> TranscribeConfig {
    TranscribeConfig::new(Credentials::new("test-id", "test-secret", BUCKET)).with_poll_policy(
        PollPolicy {
            initial_interval: MIN_POLL_INTERVAL,
            max_interval: MIN_POLL_INTERVAL,
            multiplier: 2.0,
            timeout: Duration::from_secs(10),
        },
    )
}

/// Write a small media file into `directory` and return its path
pub async fn make_media_file(directory: &TempDir, name: &str) -> PathBuf {
    let path = directory.path().join(name);
    tokio::fs::write(&path, b"RIFF....WAVEfmt ").await.unwrap();
    path
}

#[derive(Debug, Default)]
struct ScriptState {
    statuses: VecDeque<String>,
    submitted: Vec<JobSpec>,
    status_calls: usize,
    fail_submit: bool,
    fail_status: bool,
    rename_jobs: bool,
}

/// A [JobBackend] that replays a scripted sequence of raw status values.
/// Once the script runs out, the last value repeats; an empty script reports
/// `IN_PROGRESS` forever. When given an output store, it writes its output
/// there as the job is first reported `COMPLETED`, the way a real backend
/// would have written it by then.
#[derive(Clone, Debug, Default)]
pub struct ScriptedJobBackend {
    state: Arc<Mutex<ScriptState>>,
    output: Option<(MemoryObjectStore, Bytes)>,
}

impl ScriptedJobBackend {
    pub fn new(statuses: &[&str]) -> Self {
        ScriptedJobBackend {
            state: Arc::new(Mutex::new(ScriptState {
                statuses: statuses.iter().map(|status| status.to_string()).collect(),
                ..Default::default()
            })),
            output: None,
        }
    }

    pub fn with_output(mut self, store: MemoryObjectStore, output: &'static [u8]) -> Self {
        self.output = Some((store, Bytes::from_static(output)));
        self
    }

    pub async fn fail_submit(&self) {
        self.state.lock().await.fail_submit = true;
    }

    /// Acknowledge submissions under a handle other than the job name
    pub async fn rename_jobs(&self) {
        self.state.lock().await.rename_jobs = true;
    }

    pub async fn fail_status(&self) {
        self.state.lock().await.fail_status = true;
    }

    pub async fn submitted(&self) -> Vec<JobSpec> {
        self.state.lock().await.submitted.clone()
    }

    pub async fn status_calls(&self) -> usize {
        self.state.lock().await.status_calls
    }
}

#[async_trait]
impl JobBackend for ScriptedJobBackend {
    async fn submit(&self, spec: &JobSpec) -> Result<JobId> {
        let mut state = self.state.lock().await;
        if state.fail_submit {
            return Err(anyhow!("Submission refused"));
        }
        state.submitted.push(spec.clone());
        if state.rename_jobs {
            return Ok(JobId::from(format!("backend-{}", spec.job_name)));
        }
        Ok(JobId::from(spec.job_name.as_str()))
    }

    async fn raw_status(&self, job_id: &JobId) -> Result<String> {
        let status = {
            let mut state = self.state.lock().await;
            state.status_calls += 1;

            if state.fail_status {
                return Err(anyhow!("Status unavailable for {}", job_id));
            }

            match state.statuses.len() {
                0 => String::from("IN_PROGRESS"),
                1 => state.statuses[0].clone(),
                _ => state.statuses.pop_front().unwrap(),
            }
        };

        if status == "COMPLETED" {
            if let Some((store, output)) = &self.output {
                let spec = self
                    .state
                    .lock()
                    .await
                    .submitted
                    .iter()
                    .find(|spec| spec.job_name == job_id.as_str())
                    .cloned();

                if let Some(spec) = spec {
                    store
                        .put(&spec.output_locator, &spec.job_name, output.clone())
                        .await?;
                }
            }
        }

        Ok(status)
    }
}
