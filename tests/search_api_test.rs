//! Search API integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sipscope::application::SessionSearchService;
use sipscope::domain::attribute::StoreAttributeCatalog;
use sipscope::domain::document::Document;
use sipscope::domain::session::CorrelationConfig;
use sipscope::infrastructure::store::InMemorySessionStore;
use sipscope::interface::api::{build_router, init_metrics, AppState};
use std::sync::{Arc, OnceLock};
use tower::ServiceExt; // For `oneshot`

#[tokio::test]
async fn test_api_health() {
    let (app, _store) = setup_api().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], "healthy");
}

#[tokio::test]
async fn test_api_session_search() {
    let (app, store) = setup_api().await;
    seed_leg(&store, "A", "alice", "bob", 1000).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/session/search?created_at=0&terminated_at=2000&query=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["count"], 1);

    let call = &body["data"]["calls"][0];
    assert_eq!(call["createdAt"], 1000);
    assert_eq!(call["method"], "INVITE");
    assert_eq!(call["caller"], "alice");
    assert_eq!(call["callId"], json!(["A"]));
}

#[tokio::test]
async fn test_api_search_respects_limit() {
    let (app, store) = setup_api().await;
    seed_leg(&store, "A", "alice", "bob", 1000).await;
    seed_leg(&store, "B", "carol", "dave", 1500).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/session/search?created_at=0&terminated_at=2000&query=&limit=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["limit"], 1);
}

#[tokio::test]
async fn test_api_rejects_inverted_window() {
    let (app, _store) = setup_api().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/session/search?created_at=2000&terminated_at=1000&query=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Invalid query"));
}

#[tokio::test]
async fn test_api_lists_attributes() {
    let (app, store) = setup_api().await;
    let descriptor =
        Document::from_value(json!({"name": "rtp.mos", "type": "number"})).unwrap();
    store.insert_into("attributes", descriptor).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/attributes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["name"], "rtp.mos");
    assert_eq!(body["data"][0]["type"], "number");
}

#[tokio::test]
async fn test_api_metrics_endpoint() {
    let (app, _store) = setup_api().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// Helper functions

async fn setup_api() -> (Router, Arc<InMemorySessionStore>) {
    let store = Arc::new(InMemorySessionStore::new());
    let catalog = Arc::new(StoreAttributeCatalog::new(store.clone()));
    let search_service = Arc::new(SessionSearchService::new(
        store.clone(),
        catalog.clone(),
        CorrelationConfig::default(),
    ));
    let state = AppState {
        search_service,
        attribute_catalog: catalog,
    };
    (build_router(state, prometheus_handle()), store)
}

/// The Prometheus recorder can only be installed once per process
fn prometheus_handle() -> metrics_exporter_prometheus::PrometheusHandle {
    static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();
    HANDLE.get_or_init(init_metrics).clone()
}

async fn seed_leg(
    store: &InMemorySessionStore,
    call_id: &str,
    caller: &str,
    callee: &str,
    created_at: i64,
) {
    let doc = Document::from_value(json!({
        "call_id": call_id, "caller": caller, "callee": callee,
        "created_at": created_at, "terminated_at": created_at + 100,
        "state": "answered",
        "src_addr": format!("src-{}", call_id), "dst_addr": format!("dst-{}", call_id),
    }))
    .unwrap();
    store.insert("sip_call_index", created_at, doc).await;
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
