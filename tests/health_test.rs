use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use fluent_bridge::app::{AppState, IngestConfig, router};
use fluent_bridge::port::DocumentStore;
use fluent_bridge::test_support::{MockStore, StoreCall};
use serde_json::Value;
use std::sync::Arc;

fn create_test_server() -> (TestServer, Arc<MockStore>) {
    let mock_store = Arc::new(MockStore::new());
    let store: Arc<dyn DocumentStore> = mock_store.clone();
    let state = AppState::new(
        store,
        IngestConfig {
            api_key: "k".to_string(),
            default_database: "logging".to_string(),
            default_collection: "logs".to_string(),
        },
    );
    (TestServer::new(router(state)).unwrap(), mock_store)
}

#[tokio::test]
async fn test_health_endpoints_report_healthy() {
    let (server, store) = create_test_server();

    for path in ["/healthz", "/health"] {
        let response = server.get(path).await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        let timestamp = body["timestamp"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(timestamp).unwrap();
        let age = Utc::now().signed_duration_since(parsed.with_timezone(&Utc));
        assert!(age.num_seconds().abs() < 5);
    }

    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|call| matches!(call, StoreCall::Ping)));
}

#[tokio::test]
async fn test_health_needs_no_api_key() {
    let (server, _store) = create_test_server();
    // No X-API-Key header on purpose.
    server.get("/healthz").await.assert_status_ok();
}

#[tokio::test]
async fn test_health_reports_unavailable_when_store_fails() {
    let (server, store) = create_test_server();
    store.set_should_fail(true);

    let response = server.get("/healthz").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    response.assert_text("Database unhealthy");
}
