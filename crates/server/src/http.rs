//! HTTP Endpoints
//!
//! JSON adapter over `CacheManager::handle` plus cache administration.

use axum::{
    extract::{Json, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use agri_faq_agent::{CacheStats, CacheStatus, QueryResponse};
use agri_faq_core::{Classification, Response, SourceRef, Timing};
use agri_faq_text_processing::Correction;

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds);

    Router::new()
        .route("/api/query", post(query))
        .route("/api/cache/prime", post(prime_cache))
        .route("/api/cache/stats", get(cache_stats))
        .route("/admin/cache/invalidate", post(invalidate_cache))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// Disabled CORS is permissive; an empty or fully invalid origin list
/// falls back to localhost:3000.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    let allowed = if parsed_origins.is_empty() {
        tracing::info!("No valid CORS origins configured, defaulting to localhost:3000");
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        tracing::info!(origins = parsed_origins.len(), "CORS configured");
        parsed_origins
    };

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct QueryAnswer {
    pub classification: Classification,
    pub answer: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
    /// Question after term correction
    pub question: String,
    pub corrections: Vec<Correction>,
    pub cache: CacheStatus,
    pub degraded: bool,
    pub timing: Timing,
}

impl From<QueryResponse> for QueryAnswer {
    fn from(resp: QueryResponse) -> Self {
        let record = resp.record;
        let classification = record.classification();
        let (answer, sources) = match record.response {
            Response::Grounded { answer, sources } => (answer, sources),
            Response::NoContext { answer }
            | Response::OutOfDomain { answer }
            | Response::Unavailable { answer } => (answer, Vec::new()),
        };

        Self {
            classification,
            answer,
            sources,
            question: resp.normalized,
            corrections: resp.corrections,
            cache: resp.cache_status,
            degraded: record.degraded,
            timing: record.timing,
        }
    }
}

/// POST /api/query
async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryAnswer>, ServerError> {
    if request.question.trim().is_empty() {
        return Err(ServerError::InvalidRequest("question must not be empty".to_string()));
    }

    let response = state.manager.handle(&request.question).await?;
    Ok(Json(response.into()))
}

#[derive(Debug, Deserialize)]
pub struct PrimeRequest {
    pub queries: Vec<String>,
}

/// POST /api/cache/prime
///
/// Priming runs as a detached background task: no handle is kept, the
/// request returns at once and the report is logged when the run finishes.
async fn prime_cache(
    State(state): State<AppState>,
    Json(request): Json<PrimeRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let queries: Vec<String> = request
        .queries
        .into_iter()
        .filter(|q| !q.trim().is_empty())
        .collect();
    let queued = queries.len();

    drop(state.manager.prime(queries));

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "queued": queued })),
    )
}

/// GET /api/cache/stats
async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.manager.stats())
}

/// POST /admin/cache/invalidate
async fn invalidate_cache(State(state): State<AppState>) -> Result<impl IntoResponse, ServerError> {
    state.manager.invalidate_all().await?;
    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Response cache cleared"
    })))
}

/// GET /health
///
/// Degraded when the index holds no passages.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let retriever = state.manager.retriever();
    let index = retriever.index();
    let stats = state.manager.stats();
    let healthy = !index.is_empty();

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if healthy { "healthy" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "checks": {
                "index": {
                    "status": if healthy { "ok" } else { "empty" },
                    "passages": index.len(),
                    "dimension": index.dimension(),
                    "min_similarity": retriever.config().min_similarity,
                },
                "cache": {
                    "l1_entries": stats.l1_entries,
                    "l2_entries": stats.l2_entries,
                    "generation": stats.generation,
                }
            }
        })),
    )
}
