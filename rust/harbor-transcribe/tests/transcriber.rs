#[macro_use]
extern crate tracing;

mod helpers;

use bytes::Bytes;
use harbor_common::helpers::wait_millis;
use harbor_storage::{
    helpers::FailingObjectStore, MemoryObjectStore, ObjectStore, TrackingObjectStore,
};
use harbor_transcribe::{
    Credentials, JobId, PollPolicy, TranscribeConfig, TranscribeError, Transcriber,
    TranscriptOutcome, PLACEHOLDER_CLIENT_ID,
};
use helpers::{available_config, make_media_file, ScriptedJobBackend, BUCKET};
use std::{collections::HashSet, time::Duration};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn it_does_nothing_when_credentials_are_incomplete() {
    let directory = tempfile::tempdir().unwrap();
    let path = make_media_file(&directory, "a.wav").await;

    for credentials in [
        Credentials::default(),
        Credentials {
            client_id: None,
            ..Credentials::new("id", "secret", BUCKET)
        },
        Credentials {
            client_secret: None,
            ..Credentials::new("id", "secret", BUCKET)
        },
        Credentials {
            bucket: None,
            ..Credentials::new("id", "secret", BUCKET)
        },
        Credentials::new(PLACEHOLDER_CLIENT_ID, "secret", BUCKET),
    ] {
        let store = TrackingObjectStore::wrap(MemoryObjectStore::default());
        let backend = ScriptedJobBackend::new(&["COMPLETED"]);
        let transcriber = Transcriber::new(
            TranscribeConfig::new(credentials),
            store.clone(),
            backend.clone(),
        );

        assert!(!transcriber.is_available());
        assert_eq!(transcriber.transcribe(&path, None).await.unwrap(), None);
        assert_eq!(
            transcriber
                .get_result(&JobId::from("some-job"), &CancellationToken::new())
                .await
                .unwrap(),
            TranscriptOutcome::Unavailable
        );
        assert_eq!(
            transcriber
                .transcribe_and_wait(&path, Some("en-US"), &CancellationToken::new())
                .await
                .unwrap(),
            TranscriptOutcome::Unavailable
        );

        assert!(backend.submitted().await.is_empty());
        assert_eq!(backend.status_calls().await, 0);
        assert_eq!(store.to_stats().await, Default::default());
    }
}

#[tokio::test]
async fn it_transcribes_a_file_and_returns_the_output() {
    harbor_common::tracing::initialize_tracing(None);

    let directory = tempfile::tempdir().unwrap();
    let path = make_media_file(&directory, "a.wav").await;
    let store = MemoryObjectStore::default();
    let backend =
        ScriptedJobBackend::new(&["RUNNING", "COMPLETED"]).with_output(store.clone(), b"hello world");
    let transcriber = Transcriber::new(available_config(), store.clone(), backend.clone());

    let outcome = transcriber
        .transcribe_and_wait(&path, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.text().as_deref(), Some("hello world"));

    let submitted = backend.submitted().await;
    assert_eq!(submitted.len(), 1);

    let spec = &submitted[0];
    assert_eq!(outcome.job_id(), Some(&JobId::from(spec.job_name.as_str())));
    assert_eq!(spec.output_locator, BUCKET);
    assert_eq!(spec.language_hint, None);
    assert_eq!(
        spec.source_locator,
        store.url_for(BUCKET, &spec.job_name).unwrap().to_string()
    );
    assert_eq!(backend.status_calls().await, 2);

    debug!("Transcribed {:?} as {}", path, spec.job_name);
}

#[tokio::test]
async fn it_stages_the_file_under_the_job_name() {
    let directory = tempfile::tempdir().unwrap();
    let path = make_media_file(&directory, "a.wav").await;
    let store = MemoryObjectStore::default();
    let backend = ScriptedJobBackend::new(&[]);
    let transcriber = Transcriber::new(available_config(), store.clone(), backend.clone());

    let job_id = transcriber
        .transcribe(&path, Some("en-US"))
        .await
        .unwrap()
        .unwrap();

    let staged = store.require(BUCKET, job_id.as_str()).await.unwrap();
    assert_eq!(staged.bytes, tokio::fs::read(&path).await.unwrap());

    let submitted = backend.submitted().await;
    assert_eq!(submitted[0].language_hint.as_deref(), Some("en-US"));
    assert_eq!(backend.status_calls().await, 0);
}

#[tokio::test]
async fn it_uses_a_fresh_job_name_for_every_submission() {
    let directory = tempfile::tempdir().unwrap();
    let path = make_media_file(&directory, "a.wav").await;
    let backend = ScriptedJobBackend::new(&[]);
    let transcriber = Transcriber::new(
        available_config(),
        MemoryObjectStore::default(),
        backend.clone(),
    );

    let mut job_ids = HashSet::new();

    for _ in 0..10_000 {
        let job_id = transcriber.transcribe(&path, None).await.unwrap().unwrap();
        job_ids.insert(job_id);
    }

    assert_eq!(job_ids.len(), 10_000);

    let names: HashSet<String> = backend
        .submitted()
        .await
        .into_iter()
        .map(|spec| spec.job_name)
        .collect();
    assert_eq!(names.len(), 10_000);
}

#[tokio::test]
async fn it_can_retrieve_the_same_result_more_than_once() {
    let directory = tempfile::tempdir().unwrap();
    let path = make_media_file(&directory, "a.wav").await;
    let memory = MemoryObjectStore::default();
    let store = TrackingObjectStore::wrap(memory.clone());
    let backend = ScriptedJobBackend::new(&["COMPLETED"]).with_output(memory, b"hello world");
    let transcriber = Transcriber::new(available_config(), store.clone(), backend.clone());

    let job_id = transcriber.transcribe(&path, None).await.unwrap().unwrap();
    let cancel = CancellationToken::new();

    let first = transcriber.get_result(&job_id, &cancel).await.unwrap();
    let status_calls = backend.status_calls().await;
    let second = transcriber.get_result(&job_id, &cancel).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.text().as_deref(), Some("hello world"));
    assert!(backend.status_calls().await > status_calls);
    assert_eq!(backend.submitted().await.len(), 1);
    assert_eq!(store.to_stats().await.puts, 1);
}

#[tokio::test]
async fn it_does_not_submit_when_staging_fails() {
    let directory = tempfile::tempdir().unwrap();
    let path = make_media_file(&directory, "a.wav").await;
    let store = FailingObjectStore::default();
    let backend = ScriptedJobBackend::new(&["COMPLETED"]);
    let transcriber = Transcriber::new(available_config(), store.clone(), backend.clone());

    let result = transcriber.transcribe(&path, None).await;

    assert!(matches!(result, Err(TranscribeError::Upload { .. })));
    assert_eq!(store.attempted_puts(), 1);
    assert!(backend.submitted().await.is_empty());

    let result = transcriber
        .transcribe_and_wait(&path, None, &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(TranscribeError::Upload { .. })));
    assert_eq!(backend.status_calls().await, 0);
}

#[tokio::test]
async fn it_reports_a_missing_source_file_as_an_upload_failure() {
    let directory = tempfile::tempdir().unwrap();
    let backend = ScriptedJobBackend::new(&[]);
    let transcriber = Transcriber::new(
        available_config(),
        MemoryObjectStore::default(),
        backend.clone(),
    );

    let result = transcriber
        .transcribe(&directory.path().join("missing.wav"), None)
        .await;

    assert!(matches!(result, Err(TranscribeError::Upload { .. })));
    assert!(backend.submitted().await.is_empty());
}

#[tokio::test]
async fn it_reports_a_rejected_submission_as_a_backend_failure() {
    let directory = tempfile::tempdir().unwrap();
    let path = make_media_file(&directory, "a.wav").await;
    let backend = ScriptedJobBackend::new(&[]);
    backend.fail_submit().await;
    let transcriber = Transcriber::new(
        available_config(),
        MemoryObjectStore::default(),
        backend.clone(),
    );

    let result = transcriber.transcribe(&path, None).await;
    assert!(matches!(result, Err(TranscribeError::Backend(_))));
}

#[tokio::test]
async fn it_returns_failed_after_a_single_check_when_the_job_failed() {
    let directory = tempfile::tempdir().unwrap();
    let path = make_media_file(&directory, "a.wav").await;
    let backend = ScriptedJobBackend::new(&["FAILED"]);
    let transcriber = Transcriber::new(
        available_config(),
        MemoryObjectStore::default(),
        backend.clone(),
    );

    let outcome = transcriber
        .transcribe_and_wait(&path, None, &CancellationToken::new())
        .await
        .unwrap();

    let job_id = JobId::from(backend.submitted().await[0].job_name.as_str());
    assert_eq!(outcome, TranscriptOutcome::Failed { job_id });
    assert_eq!(backend.status_calls().await, 1);
}

#[tokio::test]
async fn it_keeps_polling_through_unrecognized_statuses() {
    let store = MemoryObjectStore::default();
    let backend = ScriptedJobBackend::new(&["QUEUED", "SOMETHING_NEW", "IN_PROGRESS", "COMPLETED"]);
    let transcriber = Transcriber::new(available_config(), store.clone(), backend.clone());

    store
        .put(BUCKET, "job", Bytes::from_static(b"hello world"))
        .await
        .unwrap();

    let outcome = transcriber
        .get_result(&JobId::from("job"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.text().as_deref(), Some("hello world"));
    assert_eq!(backend.status_calls().await, 4);
}

#[tokio::test]
async fn it_never_polls_without_credentials() {
    let backend = ScriptedJobBackend::new(&["COMPLETED"]);
    let transcriber = Transcriber::new(
        TranscribeConfig::new(Credentials::default()),
        MemoryObjectStore::default(),
        backend.clone(),
    );

    for _ in 0..3 {
        let outcome = transcriber
            .get_result(&JobId::from("job"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, TranscriptOutcome::Unavailable);
    }

    assert_eq!(backend.status_calls().await, 0);
}

#[tokio::test]
async fn it_rejects_a_job_acknowledged_under_another_name() {
    let directory = tempfile::tempdir().unwrap();
    let path = make_media_file(&directory, "a.wav").await;
    let backend = ScriptedJobBackend::new(&["COMPLETED"]);
    backend.rename_jobs().await;
    let transcriber = Transcriber::new(
        available_config(),
        MemoryObjectStore::default(),
        backend.clone(),
    );

    let result = transcriber
        .transcribe_and_wait(&path, None, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(TranscribeError::Backend(_))));
    assert_eq!(backend.submitted().await.len(), 1);
    assert_eq!(backend.status_calls().await, 0);
}

#[tokio::test]
async fn it_reports_missing_output_of_a_completed_job() {
    let backend = ScriptedJobBackend::new(&["COMPLETED"]);
    let transcriber = Transcriber::new(
        available_config(),
        MemoryObjectStore::default(),
        backend.clone(),
    );

    let result = transcriber
        .get_result(&JobId::from("job"), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(TranscribeError::MissingOutput(_))));
}

#[tokio::test]
async fn it_reports_status_failures_as_backend_failures() {
    let backend = ScriptedJobBackend::new(&["IN_PROGRESS"]);
    backend.fail_status().await;
    let transcriber = Transcriber::new(
        available_config(),
        MemoryObjectStore::default(),
        backend.clone(),
    );

    let result = transcriber
        .get_result(&JobId::from("job"), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(TranscribeError::Backend(_))));
}

#[tokio::test(start_paused = true)]
async fn it_times_out_when_the_job_never_finishes() {
    let backend = ScriptedJobBackend::new(&[]);
    let policy = PollPolicy {
        initial_interval: Duration::from_secs(1),
        max_interval: Duration::from_secs(30),
        multiplier: 2.0,
        timeout: Duration::from_secs(5 * 60),
    };
    let transcriber = Transcriber::new(
        available_config().with_poll_policy(policy.clone()),
        MemoryObjectStore::default(),
        backend.clone(),
    );

    let result = transcriber
        .get_result(&JobId::from("job"), &CancellationToken::new())
        .await;

    match result {
        Err(TranscribeError::Timeout { job_id, timeout }) => {
            assert_eq!(job_id, JobId::from("job"));
            assert_eq!(timeout, policy.timeout);
        }
        other => panic!("Expected a timeout, got {:?}", other),
    }

    // 1 + 2 + 4 + 8 + 16 seconds, then every 30 seconds until five minutes
    let status_calls = backend.status_calls().await;
    assert!((12..=16).contains(&status_calls), "{}", status_calls);
}

#[tokio::test]
async fn it_stops_immediately_when_already_cancelled() {
    let backend = ScriptedJobBackend::new(&["COMPLETED"]);
    let transcriber = Transcriber::new(
        available_config(),
        MemoryObjectStore::default(),
        backend.clone(),
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = transcriber.get_result(&JobId::from("job"), &cancel).await;

    assert!(matches!(result, Err(TranscribeError::Cancelled(_))));
    assert_eq!(backend.status_calls().await, 0);
}

#[tokio::test]
async fn it_stops_waiting_when_cancelled_mid_poll() {
    let backend = ScriptedJobBackend::new(&[]);
    let transcriber = Transcriber::new(
        available_config().with_poll_policy(PollPolicy {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_millis(100),
            multiplier: 1.0,
            timeout: Duration::from_secs(60),
        }),
        MemoryObjectStore::default(),
        backend.clone(),
    );
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            wait_millis(250).await;
            cancel.cancel();
        })
    };

    let result = transcriber.get_result(&JobId::from("job"), &cancel).await;
    canceller.await.unwrap();

    assert!(matches!(result, Err(TranscribeError::Cancelled(_))));
    assert!(backend.status_calls().await > 0);
}
