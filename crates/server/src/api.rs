//! HTTP API for anomaly analytics, health checks and Prometheus metrics

use anomaly_lib::{
    Anomaly, AnomalyEngine, AnomalyError, AnomalyParams, AnomalyReport, BurstParams, EventStore,
    GapParams, Selector, SelectorParseError,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub engine: AnomalyEngine<Arc<dyn EventStore>>,
    /// Parameters applied when a request omits them
    pub defaults: AnomalyParams,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>, defaults: AnomalyParams) -> Self {
        Self {
            engine: AnomalyEngine::new(store),
            defaults,
        }
    }
}

/// Error body returned for rejected requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Errors a handler can return
#[derive(Debug)]
pub enum ApiError {
    Query(QueryRejection),
    Selector(SelectorParseError),
    Engine(AnomalyError),
    Task(tokio::task::JoinError),
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        ApiError::Query(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Task(err)
    }
}

impl From<SelectorParseError> for ApiError {
    fn from(err: SelectorParseError) -> Self {
        ApiError::Selector(err)
    }
}

impl From<AnomalyError> for ApiError {
    fn from(err: AnomalyError) -> Self {
        ApiError::Engine(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Query(err) => (StatusCode::BAD_REQUEST, "invalid_query", err.body_text()),
            ApiError::Selector(err) => (StatusCode::BAD_REQUEST, "invalid_selector", err.to_string()),
            ApiError::Engine(err @ AnomalyError::InvalidParameter { .. }) => {
                (StatusCode::BAD_REQUEST, err.code(), err.to_string())
            }
            ApiError::Engine(err @ AnomalyError::Retrieval(_)) => {
                error!(error = %err, "Event store failure");
                (StatusCode::SERVICE_UNAVAILABLE, err.code(), err.to_string())
            }
            ApiError::Task(err) => {
                error!(error = %err, "Computation task failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Computation task failed".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

/// Query for `/api/v1/analytics/bursts`
#[derive(Debug, Deserialize)]
pub struct BurstQuery {
    pub selector: String,
    pub bucket_width_days: Option<f64>,
    pub z_threshold: Option<f64>,
}

/// Query for `/api/v1/analytics/gaps`
#[derive(Debug, Deserialize)]
pub struct GapQuery {
    pub selector: String,
    pub threshold_days: Option<f64>,
    pub observation_end: Option<DateTime<Utc>>,
}

/// Query for `/api/v1/analytics/anomalies`
#[derive(Debug, Deserialize)]
pub struct AnomalyQuery {
    pub selector: String,
    pub bucket_width_days: Option<f64>,
    pub z_threshold: Option<f64>,
    pub threshold_days: Option<f64>,
    pub observation_end: Option<DateTime<Utc>>,
}

fn burst_params(defaults: &BurstParams, width: Option<f64>, z: Option<f64>) -> BurstParams {
    BurstParams {
        bucket_width_days: width.unwrap_or(defaults.bucket_width_days),
        z_threshold: z.unwrap_or(defaults.z_threshold),
    }
}

fn gap_params(
    defaults: &GapParams,
    threshold: Option<f64>,
    observation_end: Option<DateTime<Utc>>,
) -> GapParams {
    GapParams {
        threshold_days: threshold.unwrap_or(defaults.threshold_days),
        observation_end: observation_end.or(defaults.observation_end),
    }
}

/// Run an engine call on the blocking pool
async fn compute<T, F>(state: Arc<AppState>, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AnomalyEngine<Arc<dyn EventStore>>) -> Result<T, AnomalyError> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || f(&state.engine)).await?;
    Ok(result?)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn bursts(
    State(state): State<Arc<AppState>>,
    query: Result<Query<BurstQuery>, QueryRejection>,
) -> Result<Json<AnomalyReport>, ApiError> {
    let Query(query) = query?;
    let selector: Selector = query.selector.parse()?;
    let params = burst_params(&state.defaults.burst, query.bucket_width_days, query.z_threshold);

    let target = selector.clone();
    let bursts = compute(state, move |engine| engine.compute_bursts(&target, &params)).await?;
    let anomalies: Vec<Anomaly> = bursts.into_iter().map(Anomaly::from).collect();
    Ok(Json(AnomalyReport::new(selector, &anomalies)))
}

async fn gaps(
    State(state): State<Arc<AppState>>,
    query: Result<Query<GapQuery>, QueryRejection>,
) -> Result<Json<AnomalyReport>, ApiError> {
    let Query(query) = query?;
    let selector: Selector = query.selector.parse()?;
    let params = gap_params(&state.defaults.gap, query.threshold_days, query.observation_end);

    let target = selector.clone();
    let gaps = compute(state, move |engine| engine.compute_gaps(&target, &params)).await?;
    let anomalies: Vec<Anomaly> = gaps.into_iter().map(Anomaly::from).collect();
    Ok(Json(AnomalyReport::new(selector, &anomalies)))
}

async fn anomalies(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AnomalyQuery>, QueryRejection>,
) -> Result<Json<AnomalyReport>, ApiError> {
    let Query(query) = query?;
    let selector: Selector = query.selector.parse()?;
    let params = AnomalyParams {
        burst: burst_params(&state.defaults.burst, query.bucket_width_days, query.z_threshold),
        gap: gap_params(&state.defaults.gap, query.threshold_days, query.observation_end),
    };

    let target = selector.clone();
    let anomalies =
        compute(state, move |engine| engine.compute_anomalies(&target, &params)).await?;
    Ok(Json(AnomalyReport::new(selector, &anomalies)))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %err, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/v1/analytics/bursts", get(bursts))
        .route("/api/v1/analytics/gaps", get(gaps))
        .route("/api/v1/analytics/anomalies", get(anomalies))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
