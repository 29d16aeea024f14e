//! Integration tests for the server API endpoints

use anomaly_lib::{
    fixtures, AnomalyParams, AnomalyReport, Event, EventStore, InMemoryEventStore, Selector,
    StoreError,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;
use true_anomaly_server::api::{create_router, AppState, ErrorResponse};

/// Store whose backend is always down
struct UnavailableStore;

impl EventStore for UnavailableStore {
    fn fetch_events(&self, _selector: &Selector) -> Result<Vec<Event>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

fn setup_test_app() -> Router {
    let store = InMemoryEventStore::new(fixtures::seed_test_events(fixtures::demo_base()));
    let state = Arc::new(AppState::new(Arc::new(store), AnomalyParams::default()));
    create_router(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_health_returns_ok() {
    let (status, body) = get(setup_test_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn test_bursts_for_demo_pair() {
    let (status, body) = get(
        setup_test_app(),
        "/api/v1/analytics/bursts?selector=pair:B%7CA&bucket_width_days=7&z_threshold=1.5",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let report: AnomalyReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.selector, Selector::pair("A", "B"));
    assert_eq!(report.total, 1);

    let burst = &report.anomalies[0];
    assert_eq!(burst.start.to_rfc3339(), "2020-01-29T00:00:00+00:00");
    assert_eq!(burst.end.to_rfc3339(), "2020-02-05T00:00:00+00:00");
    assert_eq!(burst.count, Some(5));
    assert_eq!(burst.threshold, 1.5);
}

#[tokio::test]
async fn test_bursts_use_defaults_when_omitted() {
    let (status, body) = get(setup_test_app(), "/api/v1/analytics/bursts?selector=entity:A").await;

    assert_eq!(status, StatusCode::OK);
    let report: AnomalyReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.total, 1);
}

#[tokio::test]
async fn test_trailing_gap_with_observation_end() {
    let (status, body) = get(
        setup_test_app(),
        "/api/v1/analytics/gaps?selector=entity:B&threshold_days=30&observation_end=2020-04-01T00:00:00Z",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let report: AnomalyReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.total, 1);

    let gap = &report.anomalies[0];
    assert_eq!(gap.start.to_rfc3339(), "2020-02-02T00:00:00+00:00");
    assert_eq!(gap.duration_days, Some(59.0));
    assert_eq!(gap.threshold, 30.0);
    assert!(gap.z_score.is_none());
}

#[tokio::test]
async fn test_merged_anomalies_are_ordered() {
    let (status, body) = get(
        setup_test_app(),
        "/api/v1/analytics/anomalies?selector=pair:A%7CB&threshold_days=5&observation_end=2020-03-01T00:00:00Z",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let report: AnomalyReport = serde_json::from_slice(&body).unwrap();

    // four 7-day baseline gaps, one burst, one trailing gap
    assert_eq!(report.total, 6);
    assert!(report.anomalies.windows(2).all(|w| w[0].start <= w[1].start));
}

#[tokio::test]
async fn test_unknown_stream_is_empty_not_error() {
    let (status, body) = get(setup_test_app(), "/api/v1/analytics/anomalies?selector=source:nowhere").await;

    assert_eq!(status, StatusCode::OK);
    let report: AnomalyReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.total, 0);
    assert!(report.anomalies.is_empty());
}

#[tokio::test]
async fn test_invalid_parameter_returns_400() {
    let (status, body) = get(
        setup_test_app(),
        "/api/v1/analytics/bursts?selector=entity:A&bucket_width_days=0",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code, "invalid_parameter");
    assert!(error.error.contains("bucket_width_days"));
}

#[tokio::test]
async fn test_invalid_selector_returns_400() {
    let (status, body) = get(setup_test_app(), "/api/v1/analytics/gaps?selector=person:A").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code, "invalid_selector");
}

#[tokio::test]
async fn test_missing_selector_returns_json_400() {
    let (status, body) = get(setup_test_app(), "/api/v1/analytics/gaps").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code, "invalid_query");
    assert!(error.error.contains("selector"));
}

#[tokio::test]
async fn test_non_numeric_parameter_returns_json_400() {
    for uri in [
        "/api/v1/analytics/bursts?selector=entity:A&z_threshold=abc",
        "/api/v1/analytics/anomalies?selector=entity:A&observation_end=yesterday",
    ] {
        let (status, body) = get(setup_test_app(), uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "invalid_query");
    }
}

#[tokio::test]
async fn test_gap_threshold_beyond_width_cap_is_accepted() {
    let (status, body) = get(
        setup_test_app(),
        "/api/v1/analytics/gaps?selector=entity:A&threshold_days=40000",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let report: AnomalyReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.total, 0);
}

#[tokio::test]
async fn test_store_failure_returns_503() {
    let state = Arc::new(AppState::new(Arc::new(UnavailableStore), AnomalyParams::default()));
    let (status, body) = get(create_router(state), "/api/v1/analytics/gaps?selector=entity:A").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code, "retrieval_failed");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_engine_metrics() {
    // Run one computation so the engine metrics exist
    let _ = get(setup_test_app(), "/api/v1/analytics/bursts?selector=entity:A").await;
    let (status, body) = get(setup_test_app(), "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("true_anomaly_events_analyzed_total"));
}
