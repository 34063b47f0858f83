mod helpers;

use pinner_core::{Job, PinStatus};
use pinner_worker::{JobDispatcher, JobOutcome, JobStatus, PipelineError};
use serde_json::json;

use helpers::{
    descriptor, logo_payload, release_payload, router, MockPinStore, MockProvider, Workspace,
};

#[tokio::test]
async fn unknown_job_type_is_skipped_without_side_effects() {
    let ws = Workspace::new();
    let provider = MockProvider::new("mock");
    let store = MockPinStore::new();

    let outcome = router(&provider, &store, &ws)
        .route(&Job::new("transcode-video", json!({ "pinId": "pin-1" })))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        JobOutcome::Skipped {
            job_type: "transcode-video".to_string()
        }
    );
    assert!(provider.calls().is_empty());
    assert!(store.received().is_empty());
}

#[tokio::test]
async fn invalid_payload_is_rejected_as_unrecoverable() {
    let ws = Workspace::new();
    let provider = MockProvider::new("mock");
    let store = MockPinStore::new();

    let err = router(&provider, &store, &ws)
        .route(&Job::new(
            "pin-release-files",
            json!({ "organizationId": "org-1", "thumbnails": "not-a-list" }),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Validation(_)));
    assert!(!err.is_recoverable());
    assert!(store.received().is_empty());
}

#[tokio::test]
async fn first_attempt_does_not_reset_records() {
    let ws = Workspace::new();
    let provider = MockProvider::new("mock");
    let store = MockPinStore::new();

    router(&provider, &store, &ws)
        .route(&Job::new(
            "pin-organization-logo",
            logo_payload(&ws.file("logo.png"), "pin-logo"),
        ))
        .await
        .unwrap();

    assert_eq!(store.history("pin-logo"), vec![PinStatus::Pinned]);
}

#[tokio::test]
async fn retry_resets_every_record_before_orchestration() {
    let ws = Workspace::new();
    let provider = MockProvider::new("mock");
    let store = MockPinStore::new();

    let payload = release_payload(
        Some(descriptor(&ws.file("a.png"), "pin-main")),
        vec![descriptor(&ws.file("b.png"), "pin-thumb")],
        &[],
    );
    let retry = Job::new("pin-release-files", payload).next_attempt();

    router(&provider, &store, &ws).route(&retry).await.unwrap();

    let received = store.received();
    assert_eq!(received[0].0, "pin-main");
    assert_eq!(received[0].1.status, PinStatus::Pinning);
    assert_eq!(received[1].0, "pin-thumb");
    assert_eq!(received[1].1.status, PinStatus::Pinning);

    assert_eq!(
        store.history("pin-main"),
        vec![PinStatus::Pinning, PinStatus::Pinned]
    );
    assert_eq!(
        store.history("pin-thumb"),
        vec![PinStatus::Pinning, PinStatus::Pinned]
    );
}

#[tokio::test]
async fn reset_failure_does_not_block_the_retry() {
    let ws = Workspace::new();
    let provider = MockProvider::new("mock");
    let store = MockPinStore::new();
    store.fail_updates("pin-logo", Some(PinStatus::Pinning));

    let retry = Job::new(
        "pin-organization-logo",
        logo_payload(&ws.file("logo.png"), "pin-logo"),
    )
    .next_attempt();

    router(&provider, &store, &ws).route(&retry).await.unwrap();

    assert_eq!(store.status("pin-logo"), Some(PinStatus::Pinned));
}

#[tokio::test]
async fn terminal_hook_removes_temp_files_once_and_tolerates_repeats() {
    let ws = Workspace::new();
    let provider = MockProvider::new("mock");
    let store = MockPinStore::new();
    let main = ws.file("a.png");
    let thumb = ws.file("b.png");

    let job = Job::new(
        "pin-release-files",
        release_payload(
            Some(descriptor(&main, "pin-main")),
            vec![descriptor(&thumb, "pin-thumb")],
            &[],
        ),
    );
    let router = router(&provider, &store, &ws);

    router.on_terminal(&job, JobStatus::Failed).await;
    assert!(!main.exists());
    assert!(!thumb.exists());

    router.on_terminal(&job, JobStatus::Failed).await;
    assert!(!main.exists());
}

#[tokio::test]
async fn invalid_job_files_are_removed_when_it_fails() {
    let ws = Workspace::new();
    let provider = MockProvider::new("mock");
    let store = MockPinStore::new();
    let main = ws.file("a.png");

    let mut payload = release_payload(Some(descriptor(&main, "pin-main")), vec![], &[]);
    payload["releaseId"] = json!("");
    let job = Job::new("pin-release-files", payload);
    let router = router(&provider, &store, &ws);

    let err = router.route(&job).await.unwrap_err();
    assert!(!err.is_recoverable());

    router.on_terminal(&job, JobStatus::Failed).await;
    assert!(!main.exists());
    assert!(provider.calls().is_empty());
}
