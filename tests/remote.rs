//! Remote persistence against an in-process stand-in for the contents API.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{TimeZone, Utc};
use habit_tracker::config::RemoteConfig;
use habit_tracker::errors::StoreError;
use habit_tracker::models::{Category, Snapshot};
use habit_tracker::storage::{Persistence, RemoteStore};
use habit_tracker::store::EventStore;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
struct FakeRepo {
    file: Option<(Vec<u8>, u32)>,
    puts: Vec<Value>,
    auth: Vec<String>,
}

type Shared = Arc<Mutex<FakeRepo>>;

const FILE_PATH: &str = "/repos/someone/habits/contents/habits.json";

async fn get_file(State(repo): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let mut repo = repo.lock().await;
    if let Some(auth) = headers.get("authorization") {
        repo.auth.push(auth.to_str().unwrap_or_default().to_string());
    }
    match &repo.file {
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" }))),
        Some((bytes, version)) => {
            // the real API wraps base64 at 60 columns
            let encoded = STANDARD.encode(bytes);
            let wrapped = encoded
                .as_bytes()
                .chunks(60)
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect::<Vec<_>>()
                .join("\n");
            (
                StatusCode::OK,
                Json(json!({ "content": wrapped, "sha": format!("sha-{version}") })),
            )
        }
    }
}

async fn put_file(State(repo): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut repo = repo.lock().await;
    repo.puts.push(body.clone());

    let current = repo.file.as_ref().map(|(_, version)| format!("sha-{version}"));
    let supplied = body.get("sha").and_then(Value::as_str).map(str::to_string);
    if current != supplied {
        return (StatusCode::CONFLICT, Json(json!({ "message": "sha mismatch" })));
    }

    let content = body["content"].as_str().unwrap_or_default();
    let bytes = STANDARD.decode(content).unwrap_or_default();
    let version = repo.file.as_ref().map(|(_, version)| version + 1).unwrap_or(1);
    repo.file = Some((bytes, version));
    (
        StatusCode::OK,
        Json(json!({ "content": { "sha": format!("sha-{version}") } })),
    )
}

async fn spawn_fake_repo(repo: Shared) -> String {
    let app = Router::new()
        .route(FILE_PATH, get(get_file).put(put_file))
        .with_state(repo);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn remote_config(api_base: String) -> RemoteConfig {
    RemoteConfig {
        token: Some("test-token".into()),
        owner: Some("someone".into()),
        repo: Some("habits".into()),
        api_base,
        timeout_secs: 5,
        ..RemoteConfig::default()
    }
}

fn stored_entries(repo: &FakeRepo) -> Vec<Value> {
    let (bytes, _) = repo.file.as_ref().expect("file written");
    let document: Value = serde_json::from_slice(bytes).unwrap();
    document["entries"].as_array().cloned().unwrap_or_default()
}

#[tokio::test]
async fn missing_file_is_initialized_empty() {
    let repo = Shared::default();
    let base = spawn_fake_repo(repo.clone()).await;
    let store = RemoteStore::new(&remote_config(base)).unwrap();

    let snapshot = store.load().await.unwrap();
    assert!(snapshot.entries.is_empty());
    assert_eq!(snapshot.revision.as_deref(), Some("sha-1"));

    let repo = repo.lock().await;
    assert_eq!(repo.puts.len(), 1);
    assert!(repo.puts[0].get("sha").is_none());
    assert!(stored_entries(&repo).is_empty());
    assert_eq!(repo.auth, vec!["Bearer test-token".to_string()]);
}

#[tokio::test]
async fn writes_carry_the_last_seen_revision() {
    let repo = Shared::default();
    let base = spawn_fake_repo(repo.clone()).await;
    let backend = Persistence::Remote(RemoteStore::new(&remote_config(base)).unwrap());
    let mut store = EventStore::open(backend).await.unwrap();

    let at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let beer = store.add_at(Category::Beer, at).await.unwrap();
    store.add_at(Category::Wine, at).await.unwrap();
    assert_eq!(store.revision(), Some("sha-3"));
    assert!(store.remove(&beer.id).await.unwrap());
    assert_eq!(store.revision(), Some("sha-4"));

    let repo = repo.lock().await;
    let supplied: Vec<_> = repo
        .puts
        .iter()
        .map(|put| put.get("sha").and_then(Value::as_str).map(str::to_string))
        .collect();
    assert_eq!(
        supplied,
        vec![
            None,
            Some("sha-1".to_string()),
            Some("sha-2".to_string()),
            Some("sha-3".to_string())
        ]
    );
    let entries = stored_entries(&repo);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["category"], "wine");
    assert_eq!(repo.puts[1]["message"], "Log beer");
}

#[tokio::test]
async fn stale_revision_is_a_conflict_and_keeps_snapshot() {
    let repo = Shared::default();
    let base = spawn_fake_repo(repo.clone()).await;
    let backend = Persistence::Remote(RemoteStore::new(&remote_config(base.clone())).unwrap());
    let mut store = EventStore::open(backend).await.unwrap();

    let at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    store.add_at(Category::Beer, at).await.unwrap();

    // another writer lands first
    let other = RemoteStore::new(&remote_config(base)).unwrap();
    let mut theirs: Snapshot = other.load().await.unwrap();
    theirs.entries.clear();
    other.save(&theirs, "Clear").await.unwrap();

    let before = store.list().to_vec();
    let err = store.add_at(Category::Smoking, at).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert!(err.is_retryable());
    assert_eq!(store.list(), before.as_slice());
    assert_eq!(store.revision(), Some("sha-2"));

    assert_eq!(store.reload().await.unwrap(), 0);
    assert_eq!(store.revision(), Some("sha-3"));
    store.add_at(Category::Smoking, at).await.unwrap();
    assert_eq!(store.list().len(), 1);
}

#[tokio::test]
async fn unreachable_api_is_a_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = RemoteStore::new(&remote_config(format!("http://{addr}"))).unwrap();
    let err = store.load().await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn slow_api_times_out_as_transport_failure() {
    let app = Router::new().route(
        FILE_PATH,
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = RemoteConfig {
        timeout_secs: 1,
        ..remote_config(format!("http://{addr}"))
    };
    let store = RemoteStore::new(&config).unwrap();
    let err = store.load().await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)));
    assert!(err.is_retryable());
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn malformed_remote_file_is_a_transport_failure() {
    let repo = Shared::default();
    repo.lock().await.file = Some((b"<html>not json</html>".to_vec(), 1));
    let base = spawn_fake_repo(repo).await;

    let store = RemoteStore::new(&remote_config(base)).unwrap();
    let err = store.load().await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn missing_credentials_block_persistence() {
    let config = RemoteConfig {
        repo: Some("habits".into()),
        ..RemoteConfig::default()
    };
    let err = RemoteStore::new(&config).unwrap_err();
    assert!(matches!(err, StoreError::ConfigurationMissing(_)));
}
