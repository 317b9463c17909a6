//! Integration tests for the offline sync pipeline.
//!
//! Each test spins up an Axum server on a random port and drives the real
//! HTTP submission path: outbox -> HttpSyncClient -> endpoint.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time::timeout;

use ki_core::capability::{DurableStore, MemoryStore, SharedConnectivity};
use ki_core::offline::{HttpSyncClient, OfflineOutbox, SyncClient, SyncStatus};
use ki_core::progress::{FieldUpdate, OnboardingRecord};
use ki_core::ProgressConfig;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static INIT_TRACING: std::sync::Once = std::sync::Once::new();

/// Opt-in log output via RUST_LOG, initialized once per test binary.
fn init_tracing() {
    INIT_TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    });
}

/// Bodies the accepting endpoint has received.
type Received = Arc<Mutex<Vec<Value>>>;

async fn accept(State(received): State<Received>, Json(body): Json<Value>) -> StatusCode {
    received.lock().unwrap().push(body);
    StatusCode::OK
}

async fn reject() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Start an Axum server on a random port, return (port, received bodies).
async fn start_server() -> (u16, Received) {
    init_tracing();
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/sync", post(accept))
        .route("/reject", post(reject))
        .with_state(Arc::clone(&received));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (port, received)
}

fn named_record(name: &str) -> OnboardingRecord {
    let mut record = OnboardingRecord::fresh();
    record.apply(FieldUpdate::Name(name.to_string()));
    record
}

async fn outbox_for(endpoint: String) -> Arc<OfflineOutbox> {
    OfflineOutbox::open(
        Arc::new(MemoryStore::new()) as Arc<dyn DurableStore>,
        SharedConnectivity::new(true),
        Arc::new(HttpSyncClient::new(endpoint)) as Arc<dyn SyncClient>,
        ProgressConfig::default(),
    )
    .await
}

#[tokio::test]
async fn accepted_entries_are_marked_synced() {
    timeout(TEST_TIMEOUT, async {
        let (port, received) = start_server().await;
        let outbox = outbox_for(format!("http://127.0.0.1:{port}/sync")).await;

        outbox.enqueue(named_record("Ava")).await;
        outbox.enqueue(named_record("Ben")).await;

        let report = outbox.sync().await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.synced, 2);
        assert_eq!(report.failed, 0);
        assert!(
            outbox
                .entries()
                .await
                .iter()
                .all(|e| e.sync_status == SyncStatus::Synced)
        );

        let bodies = received.lock().unwrap();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0]["name"], "Ava");
        assert_eq!(bodies[1]["name"], "Ben");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn submitted_body_carries_sync_metadata() {
    timeout(TEST_TIMEOUT, async {
        let (port, received) = start_server().await;
        let outbox = outbox_for(format!("http://127.0.0.1:{port}/sync")).await;

        outbox.enqueue(named_record("Ava")).await;
        let captured_at = outbox.entries().await[0].captured_at;

        outbox.sync().await;

        let bodies = received.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        // Payload fields at the top level, capture time as epoch millis,
        // submission time as an RFC 3339 string.
        assert_eq!(bodies[0]["name"], "Ava");
        assert_eq!(
            bodies[0]["offlineTimestamp"],
            captured_at.timestamp_millis()
        );
        let synced_at = bodies[0]["syncedAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(synced_at).is_ok());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn server_error_marks_entry_failed_and_keeps_it() {
    timeout(TEST_TIMEOUT, async {
        let (port, _received) = start_server().await;
        let outbox = outbox_for(format!("http://127.0.0.1:{port}/reject")).await;

        outbox.enqueue(named_record("Ava")).await;

        let report = outbox.sync().await;

        assert_eq!(report.attempted, 1);
        assert_eq!(report.failed, 1);
        let entries = outbox.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sync_status, SyncStatus::Failed);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
    timeout(TEST_TIMEOUT, async {
        // Bind and immediately drop a listener to get a dead port.
        let dead_port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let outbox = outbox_for(format!("http://127.0.0.1:{dead_port}/sync")).await;

        outbox.enqueue(named_record("Ava")).await;

        let report = outbox.sync().await;

        assert_eq!(report.failed, 1);
        assert_eq!(
            outbox.entries().await[0].sync_status,
            SyncStatus::Failed
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn retry_failed_resubmits_to_a_recovered_endpoint() {
    timeout(TEST_TIMEOUT, async {
        // First pass against a dead port fails; the endpoint then "recovers"
        // for the retry. The outbox is rebuilt around the same storage the
        // way a restarted client would be.
        let (port, received) = start_server().await;
        let backing = Arc::new(MemoryStore::new());
        let connectivity = SharedConnectivity::new(true);

        let dead_port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let broken = OfflineOutbox::open(
            Arc::clone(&backing) as Arc<dyn DurableStore>,
            connectivity.clone(),
            Arc::new(HttpSyncClient::new(format!("http://127.0.0.1:{dead_port}/sync")))
                as Arc<dyn SyncClient>,
            ProgressConfig::default(),
        )
        .await;
        broken.enqueue(named_record("Ava")).await;
        broken.sync().await;
        assert_eq!(broken.entries().await[0].sync_status, SyncStatus::Failed);
        drop(broken);

        let recovered = OfflineOutbox::open(
            Arc::clone(&backing) as Arc<dyn DurableStore>,
            connectivity.clone(),
            Arc::new(HttpSyncClient::new(format!("http://127.0.0.1:{port}/sync")))
                as Arc<dyn SyncClient>,
            ProgressConfig::default(),
        )
        .await;
        assert_eq!(recovered.entries().await.len(), 1, "failure survived reload");

        let report = recovered.retry_failed().await;

        assert_eq!(report.synced, 1);
        assert_eq!(
            recovered.entries().await[0].sync_status,
            SyncStatus::Synced
        );
        assert_eq!(received.lock().unwrap().len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn reconnect_triggers_auto_sync_end_to_end() {
    timeout(TEST_TIMEOUT, async {
        let (port, received) = start_server().await;
        let connectivity = SharedConnectivity::new(false);
        let outbox = OfflineOutbox::open(
            Arc::new(MemoryStore::new()) as Arc<dyn DurableStore>,
            connectivity.clone(),
            Arc::new(HttpSyncClient::new(format!("http://127.0.0.1:{port}/sync")))
                as Arc<dyn SyncClient>,
            ProgressConfig {
                sync_debounce: Duration::from_millis(50),
                ..ProgressConfig::default()
            },
        )
        .await;
        let _task = outbox.spawn_auto_sync();
        tokio::time::sleep(Duration::from_millis(10)).await;

        outbox.enqueue(named_record("Ava")).await;
        assert!(received.lock().unwrap().is_empty());

        connectivity.set_online(true);
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(received.lock().unwrap().len(), 1);
        assert_eq!(
            outbox.entries().await[0].sync_status,
            SyncStatus::Synced
        );
    })
    .await
    .expect("test timed out");
}
