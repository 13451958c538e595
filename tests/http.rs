use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct EventResponse {
    id: String,
    category: String,
}

#[derive(Debug, Deserialize)]
struct Totals {
    beer: u64,
    wine: u64,
}

#[derive(Debug, Deserialize)]
struct StatisticsResponse {
    totals: Totals,
    grand_total: u64,
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    period: u32,
    granularity: String,
    buckets: Vec<serde_json::Value>,
    statistics: StatisticsResponse,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("habit_tracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/config")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_habit_tracker"))
        .env("PORT", port.to_string())
        .env("HABIT_STORAGE", "local")
        .env("HABIT_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn events(client: &Client, base_url: &str) -> Vec<EventResponse> {
    client
        .get(format!("{base_url}/api/events"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn report(client: &Client, base_url: &str, period: u32) -> ReportResponse {
    client
        .get(format!("{base_url}/api/report?period={period}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_logging_an_entry_updates_log_and_report() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = report(&client, &server.base_url, 7).await;

    let response = client
        .post(format!("{}/api/events", server.base_url))
        .json(&serde_json::json!({ "category": "beer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: EventResponse = response.json().await.unwrap();
    assert_eq!(created.category, "beer");

    let log = events(&client, &server.base_url).await;
    assert_eq!(log[0].id, created.id);

    let after = report(&client, &server.base_url, 7).await;
    assert_eq!(after.period, 7);
    assert_eq!(after.granularity, "day");
    assert_eq!(after.statistics.totals.beer, before.statistics.totals.beer + 1);
    assert_eq!(after.statistics.totals.wine, before.statistics.totals.wine);
    assert_eq!(after.statistics.grand_total, before.statistics.grand_total + 1);
    assert!(!after.buckets.is_empty());
}

#[tokio::test]
async fn http_unknown_category_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = events(&client, &server.base_url).await.len();
    let response = client
        .post(format!("{}/api/events", server.base_url))
        .json(&serde_json::json!({ "category": "coffee" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(events(&client, &server.base_url).await.len(), before);
}

#[tokio::test]
async fn http_delete_removes_only_existing_entries() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let created: EventResponse = client
        .post(format!("{}/api/events", server.base_url))
        .json(&serde_json::json!({ "category": "wine" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let before = events(&client, &server.base_url).await.len();

    let missing = client
        .delete(format!("{}/api/events/no-such-id", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(events(&client, &server.base_url).await.len(), before);

    let removed = client
        .delete(format!("{}/api/events/{}", server.base_url, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);
    let remaining = events(&client, &server.base_url).await;
    assert_eq!(remaining.len(), before - 1);
    assert!(remaining.iter().all(|event| event.id != created.id));
}

#[tokio::test]
async fn http_report_validates_period() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let invalid = client
        .get(format!("{}/api/report?period=14", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let quarterly = report(&client, &server.base_url, 90).await;
    assert_eq!(quarterly.granularity, "week");
}

#[tokio::test]
async fn http_index_renders_category_buttons() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains(r#"action="/log/smoking""#));
    assert!(page.contains("Storage: local"));
}
