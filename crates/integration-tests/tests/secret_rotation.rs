//! Secret lifecycle with the file store, and fire-time resolution of the
//! secret reference carried by job specs

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Stack, NOW};
use hottub_core::application::{JobSpecBuilder, TriggerDispatcher, TriggerRetryPolicy};
use hottub_core::error::AppError;
use hottub_core::port::trigger::mocks::ScriptedTransport;
use hottub_core::port::SecretStore;
use hottub_infra_system::FileArtifactStore;

#[tokio::test]
async fn test_verify_follows_rotation() {
    let stack = Stack::new().await;
    let secrets = stack.secrets();

    let original = secrets.current().await.unwrap();
    assert!(secrets.verify(original.expose()).await.unwrap());
    assert!(!secrets.verify("hts_v1_wrong").await.unwrap());

    stack.clock.advance(1_000);
    let (old, new) = secrets.rotate().await.unwrap();
    assert_eq!(old, Some(original.clone()));
    assert!(!secrets.verify(original.expose()).await.unwrap());
    assert!(secrets.verify(new.expose()).await.unwrap());

    let backup = stack.path(&format!("hottub.secret.bak.{}", NOW + 1_000));
    assert_eq!(
        std::fs::read_to_string(backup).unwrap().trim(),
        original.expose()
    );
}

#[tokio::test]
async fn test_jobs_built_before_rotation_fire_with_new_secret() {
    let stack = Stack::new().await;
    let secrets = stack.secrets();
    let builder = JobSpecBuilder::new(secrets.clone(), stack.artifacts());

    let spec = builder
        .build_start_job("evt-rotation", 101.0, NOW + 60_000)
        .await
        .unwrap();
    let artifact = spec.artifact.clone().unwrap();

    // The artifact carries a reference, never the value
    let on_disk = std::fs::read_to_string(&artifact).unwrap();
    let before = secrets.current().await.unwrap();
    assert!(!on_disk.contains(before.expose()));

    let (_, rotated) = secrets.rotate().await.unwrap();

    let transport = ScriptedTransport::new();
    let dispatcher = TriggerDispatcher::new(
        secrets.clone(),
        Arc::new(transport.clone()),
        TriggerRetryPolicy::new(2, Duration::ZERO),
    );
    let loaded = FileArtifactStore::load(&artifact).await.unwrap();
    let report = dispatcher.fire(&loaded).await.unwrap();

    assert_eq!(report.attempts, 1);
    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].endpoint, "start-heating");
    assert_eq!(calls[0].auth, rotated.expose());
    assert_eq!(
        calls[0].parameters.get("id").map(String::as_str),
        Some("evt-rotation")
    );

    builder.cleanup(&loaded).await.unwrap();
    assert!(!artifact.exists());
}

#[tokio::test]
async fn test_jobs_require_an_initialized_secret() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = Arc::new(hottub_infra_system::FileSecretStore::new(
        dir.path().join("missing.secret"),
        dir.path().join("audit.log"),
        Arc::new(hottub_core::port::time_provider::SystemTimeProvider),
    ));
    let artifacts = Arc::new(FileArtifactStore::new(dir.path().join("jobs")));
    let builder = JobSpecBuilder::new(secrets, artifacts);

    let result = builder
        .build_start_job("evt-nosecret", 101.0, NOW + 60_000)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(!dir.path().join("jobs").exists());
}
