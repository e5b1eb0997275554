//! JSON HTTP server.
//!
//! Exposes the visualization and search pipeline to the browser client.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/visualize` | Build (and cache) a batch's feature collection |
//! | `POST` | `/api/ai-search` | Semantic search over a cached batch |
//! | `POST` | `/api/video-url` | Force-refresh a signed video URL |
//! | `GET`  | `/api/map/{batch_id}` | Interactive HTML map for a cached batch |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `embeddings_disabled` (400), `upstream` (502), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the map client is
//! served from arbitrary origins during development.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::connector_nomadic::NomadicClient;
use crate::ingest;
use crate::models::FeatureCollection;
use crate::render;
use crate::search;
use crate::store::BatchStore;
use crate::video::VideoUrlCache;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub batches: Arc<BatchStore>,
    pub video_urls: Arc<VideoUrlCache>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            batches: Arc::new(BatchStore::new()),
            video_urls: Arc::new(VideoUrlCache::new()),
        }
    }
}

/// Build the application router. Separated from [`run_server`] so tests
/// can drive it without binding a socket.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/api/visualize", post(handle_visualize))
        .route("/api/ai-search", post(handle_ai_search))
        .route("/api/video-url", post(handle_video_url))
        .route("/api/map/{batch_id}", get(handle_map))
        .route("/health", get(handle_health));

    // Static hosting for the browser client build, with HTML fallback
    if let Some(ref static_dir) = state.config.server.static_dir {
        if static_dir.exists() {
            let serve =
                ServeDir::new(static_dir).append_index_html_on_directories(true);
            app = app.fallback_service(serve);
        } else {
            eprintln!(
                "Warning: static_dir not found at '{}'; static hosting disabled",
                static_dir.display()
            );
        }
    }

    app.layer(cors).with_state(state)
}

/// Start the HTTP server.
///
/// Binds to the address configured in `[server].bind` and runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = build_app(AppState::new(config.clone()));

    println!("Incident Atlas listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn embeddings_disabled(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "embeddings_disabled".to_string(),
        message: message.into(),
    }
}

fn upstream_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream".to_string(),
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Map pipeline/search errors onto the HTTP error contract without
/// needing a dedicated error enum on the library side.
fn classify_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    if msg.contains("not loaded") || msg.contains("not found") {
        not_found(msg)
    } else if msg.contains("embedding provider disabled") || msg.contains("provider is disabled") {
        embeddings_disabled(msg)
    } else if msg.contains("must not be empty") || msg.contains("Unknown") {
        bad_request(msg)
    } else if msg.contains("API error") || msg.contains("after retries") {
        upstream_error(msg)
    } else {
        internal_error(msg)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/visualize ============

/// Request body for `/api/visualize`.
#[derive(Deserialize)]
struct VisualizeRequest {
    #[serde(rename = "batchId")]
    batch_id: String,
    /// Label filter; `"all"`, empty, or absent means no filter.
    #[serde(default)]
    filter: Option<String>,
}

async fn handle_visualize(
    State(state): State<AppState>,
    Json(request): Json<VisualizeRequest>,
) -> Result<Json<FeatureCollection>, AppError> {
    if request.batch_id.trim().is_empty() {
        return Err(bad_request("batchId must not be empty"));
    }

    let outcome = ingest::run_visualize(
        &state.config,
        &state.batches,
        &request.batch_id,
        request.filter.as_deref(),
    )
    .await
    .map_err(classify_error)?;

    if outcome.skipped > 0 {
        eprintln!(
            "Warning: batch {}: skipped {} rows with invalid GPS data",
            request.batch_id, outcome.skipped
        );
    }

    Ok(Json(outcome.collection))
}

// ============ POST /api/ai-search ============

/// Request body for `/api/ai-search`.
#[derive(Deserialize)]
struct SearchRequest {
    #[serde(rename = "batchId")]
    batch_id: String,
    query: String,
}

/// Response body for `/api/ai-search`.
#[derive(Serialize)]
struct SearchResponse {
    matching_ids: Vec<String>,
}

async fn handle_ai_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let matching_ids = search::search_batch(
        &state.config,
        &state.batches,
        &request.batch_id,
        &request.query,
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(SearchResponse { matching_ids }))
}

// ============ POST /api/video-url ============

/// Request body for `/api/video-url`.
#[derive(Deserialize)]
struct VideoUrlRequest {
    #[serde(rename = "videoId")]
    video_id: String,
}

/// Response body for `/api/video-url`.
#[derive(Serialize)]
struct VideoUrlResponse {
    url: String,
}

async fn handle_video_url(
    State(state): State<AppState>,
    Json(request): Json<VideoUrlRequest>,
) -> Result<Json<VideoUrlResponse>, AppError> {
    if request.video_id.trim().is_empty() {
        return Err(bad_request("videoId must not be empty"));
    }

    let client = NomadicClient::new(&state.config.nomadic).map_err(classify_error)?;

    // The client asks here because its cached URL stopped working, so the
    // cache is always bypassed.
    let url = state
        .video_urls
        .signed_url(&client, &request.video_id, true)
        .await
        .map_err(classify_error)?;

    Ok(Json(VideoUrlResponse { url }))
}

// ============ GET /api/map/{batch_id} ============

async fn handle_map(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let entry = state
        .batches
        .get(&batch_id)
        .ok_or_else(|| not_found(format!("batch not loaded: {}. Run visualize first.", batch_id)))?;

    Ok(Html(render::render_map(&batch_id, &entry.features)))
}
