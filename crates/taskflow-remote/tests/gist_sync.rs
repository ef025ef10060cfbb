//! End-to-end tests: `GistSync` against a local mock gist server.

use std::fs;
use std::path::Path;

use taskflow_remote::core::{ForceMode, SyncOptions, VersionToken};
use taskflow_remote::store::MetadataStore;
use taskflow_remote::sync::{GistConfig, SyncError};
use taskflow_remote::{
    Decision, GistSync, InitOutcome, RemoteConfig, RemoteError, StorageConfig, SyncOutcome,
};
use taskflow_remote_testkit::MockGist;
use tempfile::TempDir;

const EMPTY: &str = "tasks: []\n";
const ONE_TASK: &str = "tasks:\n- id: 1\n  title: buy milk\n";
const OTHER_TASK: &str = "tasks:\n- id: 1\n  title: walk dog\n";
const GIST_ID: &str = "g-123";

fn open(dir: &Path, server: &MockGist, token: &str) -> GistSync {
    let gist = GistConfig::default()
        .with_api_base(server.api_base())
        .with_token(token);
    GistSync::open(RemoteConfig::new(StorageConfig::new(dir), gist)).unwrap()
}

async fn configured(dir: &Path, server: &MockGist) -> GistSync {
    let gist = open(dir, server, "secret");
    gist.metadata().set_remote_id(GIST_ID).await.unwrap();
    gist
}

fn server_with(main: &str) -> MockGist {
    MockGist::with_files(GIST_ID, &[("tasks.yaml", main), ("tasks.archive.yaml", EMPTY)]).unwrap()
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

#[tokio::test]
async fn test_first_sync_then_push() {
    let dir = TempDir::new().unwrap();
    let server = server_with(EMPTY);
    fs::write(dir.path().join("tasks.yaml"), ONE_TASK).unwrap();
    let gist = configured(dir.path(), &server).await;

    let outcome = gist.sync(&SyncOptions::new()).await.unwrap();
    assert_eq!(outcome, SyncOutcome::FirstSyncPulled { version: "v1".into() });
    assert_eq!(read(dir.path(), "tasks.yaml"), EMPTY);
    assert_eq!(read(dir.path(), "tasks.archive.yaml"), EMPTY);
    assert_eq!(gist.metadata().read_metadata().await.unwrap().last_version.as_str(), "v1");

    fs::write(dir.path().join("tasks.yaml"), ONE_TASK).unwrap();
    let outcome = gist.sync(&SyncOptions::new()).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Pushed { version: "v2".into() });
    assert_eq!(server.file("tasks.yaml").as_deref(), Some(ONE_TASK));
    assert_eq!(server.version(), "v2");
    assert_eq!(gist.metadata().read_metadata().await.unwrap().last_version.as_str(), "v2");

    let outcome = gist.sync(&SyncOptions::new()).await.unwrap();
    assert_eq!(outcome, SyncOutcome::UpToDate);
    assert_eq!(server.count("PATCH"), 1);
}

#[tokio::test]
async fn test_requests_carry_token_and_accept() {
    let dir = TempDir::new().unwrap();
    let server = server_with(EMPTY);
    fs::write(dir.path().join("tasks.yaml"), EMPTY).unwrap();
    let gist = configured(dir.path(), &server).await;

    gist.sync(&SyncOptions::new()).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, format!("/gists/{GIST_ID}"));
    assert_eq!(requests[0].authorization.as_deref(), Some("token secret"));
}

#[tokio::test]
async fn test_init_creates_gist_once() {
    let dir = TempDir::new().unwrap();
    let server = MockGist::start("new-gist").unwrap();
    let gist = open(dir.path(), &server, "secret");

    let outcome = gist.init(true).await.unwrap();
    assert_eq!(outcome, InitOutcome::Created("new-gist".into()));
    assert_eq!(gist.gist_id().await.unwrap().as_deref(), Some("new-gist"));
    assert!(server.is_public());
    assert_eq!(server.file("tasks.yaml").as_deref(), Some(EMPTY));
    assert_eq!(server.file("tasks.archive.yaml").as_deref(), Some(EMPTY));

    let again = gist.init(false).await.unwrap();
    assert_eq!(again, InitOutcome::AlreadyConfigured("new-gist".into()));
    assert_eq!(server.count("POST"), 1);
}

#[tokio::test]
async fn test_missing_token_makes_no_requests() {
    let dir = TempDir::new().unwrap();
    let server = server_with(EMPTY);
    fs::write(dir.path().join("tasks.yaml"), EMPTY).unwrap();
    let gist = open(dir.path(), &server, "");
    gist.metadata().set_remote_id(GIST_ID).await.unwrap();

    let err = gist.sync(&SyncOptions::new()).await.unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Sync(SyncError::CredentialMissing { .. })
    ));
    assert!(matches!(
        gist.init(false).await,
        Ok(InitOutcome::AlreadyConfigured(_))
    ));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_divergence_then_forced_pull() {
    let dir = TempDir::new().unwrap();
    let server = server_with(EMPTY);
    fs::write(dir.path().join("tasks.yaml"), EMPTY).unwrap();
    let gist = configured(dir.path(), &server).await;
    gist.sync(&SyncOptions::new()).await.unwrap();

    fs::write(dir.path().join("tasks.yaml"), ONE_TASK).unwrap();
    server.set_files(&[("tasks.yaml", OTHER_TASK)]);

    let outcome = gist.sync(&SyncOptions::new()).await.unwrap();
    assert!(outcome.is_diverged());
    assert!(outcome.to_string().contains("Remote hash:"));
    assert_eq!(read(dir.path(), "tasks.yaml"), ONE_TASK);
    assert_eq!(server.file("tasks.yaml").as_deref(), Some(OTHER_TASK));
    assert_eq!(server.count("PATCH"), 0);

    let forced = SyncOptions {
        force: true,
        mode: None,
    };
    assert!(matches!(
        gist.sync(&forced).await,
        Err(RemoteError::Sync(SyncError::Mode(_)))
    ));

    let outcome = gist
        .sync(&SyncOptions::forced(ForceMode::Pull))
        .await
        .unwrap();
    assert_eq!(outcome, SyncOutcome::ForcedPull { version: "v2".into() });
    assert_eq!(read(dir.path(), "tasks.yaml"), OTHER_TASK);
}

#[tokio::test]
async fn test_forced_push_overwrites_remote() {
    let dir = TempDir::new().unwrap();
    let server = server_with(EMPTY);
    fs::write(dir.path().join("tasks.yaml"), EMPTY).unwrap();
    let gist = configured(dir.path(), &server).await;
    gist.sync(&SyncOptions::new()).await.unwrap();

    fs::write(dir.path().join("tasks.yaml"), ONE_TASK).unwrap();
    server.set_files(&[("tasks.yaml", OTHER_TASK)]);

    let outcome = gist
        .sync(&SyncOptions::forced(ForceMode::Push))
        .await
        .unwrap();
    assert_eq!(outcome, SyncOutcome::ForcedPush { version: "v3".into() });
    assert_eq!(server.file("tasks.yaml").as_deref(), Some(ONE_TASK));
}

#[tokio::test]
async fn test_server_error_leaves_metadata() {
    let dir = TempDir::new().unwrap();
    let server = server_with(EMPTY);
    fs::write(dir.path().join("tasks.yaml"), EMPTY).unwrap();
    let gist = configured(dir.path(), &server).await;
    gist.sync(&SyncOptions::new()).await.unwrap();
    let before = gist.metadata().read_metadata().await.unwrap();

    fs::write(dir.path().join("tasks.yaml"), ONE_TASK).unwrap();
    server.fail_next(500);
    let err = gist.sync(&SyncOptions::new()).await.unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Sync(SyncError::Network {
            status: Some(500),
            ..
        })
    ));
    assert_eq!(gist.metadata().read_metadata().await.unwrap(), before);
    assert_eq!(server.version(), "v1");
}

#[tokio::test]
async fn test_truncated_files_are_fetched_raw() {
    let dir = TempDir::new().unwrap();
    let server = server_with(ONE_TASK);
    server.truncate_files(true);
    let gist = configured(dir.path(), &server).await;

    gist.pull().await.unwrap();
    assert_eq!(read(dir.path(), "tasks.yaml"), ONE_TASK);
    assert!(server.requests().iter().any(|r| r.path == "/raw/tasks.yaml"));
}

#[tokio::test]
async fn test_missing_remote_archive_reads_empty() {
    let dir = TempDir::new().unwrap();
    let server = MockGist::with_files(GIST_ID, &[("tasks.yaml", ONE_TASK)]).unwrap();
    let gist = configured(dir.path(), &server).await;

    let version = gist.pull().await.unwrap();
    assert_eq!(version, VersionToken::from("v1"));
    assert_eq!(read(dir.path(), "tasks.archive.yaml"), EMPTY);
}

#[tokio::test]
async fn test_blind_pull_and_push_keep_metadata() {
    let dir = TempDir::new().unwrap();
    let server = server_with(ONE_TASK);
    let gist = configured(dir.path(), &server).await;

    gist.pull().await.unwrap();
    fs::write(dir.path().join("tasks.yaml"), OTHER_TASK).unwrap();
    let version = gist.push().await.unwrap();

    assert_eq!(version.as_str(), "v2");
    assert_eq!(server.file("tasks.yaml").as_deref(), Some(OTHER_TASK));
    assert!(gist.metadata().read_metadata().await.unwrap().is_first_sync());
}

#[tokio::test]
async fn test_pull_rejects_document_without_marker() {
    let dir = TempDir::new().unwrap();
    let server = server_with("just some text\n");
    fs::write(dir.path().join("tasks.yaml"), ONE_TASK).unwrap();
    let gist = configured(dir.path(), &server).await;

    assert!(gist.pull().await.is_err());
    assert_eq!(read(dir.path(), "tasks.yaml"), ONE_TASK);
}

#[tokio::test]
async fn test_status_previews_fast_forward() {
    let dir = TempDir::new().unwrap();
    let server = server_with(EMPTY);
    fs::write(dir.path().join("tasks.yaml"), EMPTY).unwrap();
    let gist = configured(dir.path(), &server).await;
    gist.sync(&SyncOptions::new()).await.unwrap();

    server.set_files(&[("tasks.yaml", ONE_TASK)]);
    let status = gist.status().await.unwrap();

    assert_eq!(status.planned, Decision::FastForward);
    assert!(status.remote_changed);
    assert!(!status.local_changed);
    assert_eq!(read(dir.path(), "tasks.yaml"), EMPTY);
}
