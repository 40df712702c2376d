//! HTTP API server for the timestamp-search frontend.
//!
//! Provides REST endpoints for ingesting captions and searching indexed sources.

use crate::captions::CaptionFormat;
use crate::cli::Output;
use crate::config::{ServerSettings, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::LecnavError;
use crate::ingest::{IngestOptions, Ingestor};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::openai::require_api_key;
use crate::retrieval::{HybridRetriever, Query, StoreBackend};
use crate::segment::SegmentPreset;
use crate::vector_store::{open_store, IndexedSource, VectorStore};
use axum::{
    body::Body,
    extract::{MatchedPath, Path, State},
    http::{HeaderValue, Method, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, info_span, warn, Instrument};

/// Maximum snippet length in characters.
const SNIPPET_CHARS: usize = 300;

/// Shared application state.
struct AppState {
    ingestor: Ingestor,
    retriever: HybridRetriever,
    store: Arc<dyn VectorStore>,
    metrics: Metrics,
    default_k: usize,
}

impl AppState {
    fn new(settings: Settings) -> crate::Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        let store = open_store(&settings)?;
        Self::with_components(settings, embedder, store)
    }

    fn with_components(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> crate::Result<Self> {
        let retriever = HybridRetriever::new(
            embedder.clone(),
            Arc::new(StoreBackend::new(store.clone())),
        )
        .with_config(settings.retrieval.to_config()?);
        let default_k = settings.retrieval.default_k;

        Ok(Self {
            ingestor: Ingestor::with_components(settings, embedder, store.clone()),
            retriever,
            store,
            metrics: Metrics::new(),
            default_k,
        })
    }
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<&str>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or(&settings.server.host).to_string();
    let port = port.unwrap_or(settings.server.port);
    let cors = cors_layer(&settings.server);

    require_api_key()?;
    let state = Arc::new(AppState::new(settings)?);
    let app = router(state).layer(cors);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("lecnav API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Search", "POST /api/search_timestamps");
    Output::kv("Ingest", "POST /api/ingest");
    Output::kv("List Sources", "GET  /api/sources");
    Output::kv("Get Source", "GET  /api/sources/{source_id}");
    Output::kv("Metrics", "GET  /metrics");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Server shutting down");
        })
        .await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/search_timestamps", post(search_timestamps))
        .route("/api/ingest", post(ingest))
        .route("/api/sources", get(list_sources))
        .route("/api/sources/{source_id}", get(get_source))
        .layer(middleware::from_fn_with_state(state.clone(), request_id))
        .with_state(state)
}

/// Build the CORS layer. An empty origin list allows any origin.
fn cors_layer(server: &ServerSettings) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if server.cors_allow_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Tag every request with a short id, record its count and latency, and log its outcome.
async fn request_id(State(state): State<Arc<AppState>>, request: Request<Body>, next: Next) -> Response {
    let id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
    // Route templates keep per-source paths under one key.
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let span = info_span!(
        "request",
        id = %id,
        method = %request.method(),
        path = %path
    );

    async move {
        let started = Instant::now();
        let mut response = next.run(request).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        record_request(&state.metrics, &path, elapsed_ms);
        info!(
            status = response.status().as_u16(),
            elapsed_ms = format!("{:.1}", elapsed_ms),
            "Request finished"
        );

        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&id) {
            headers.insert("x-request-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("{:.1}", elapsed_ms)) {
            headers.insert("x-response-time-ms", value);
        }
        response
    }
    .instrument(span)
    .await
}

fn record_request(metrics: &Metrics, path: &str, elapsed_ms: f64) {
    metrics.inc_counter(&format!("requests_total:{}", path));
    metrics.observe(&format!("latency_ms:{}", path), elapsed_ms);
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    k: Option<usize>,
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<TimestampHit>,
}

#[derive(Debug, Serialize)]
struct TimestampHit {
    video_id: String,
    t_start: f64,
    t_end: f64,
    title: String,
    snippet: String,
    score: f32,
}

#[derive(Debug, Deserialize)]
struct IngestRequest {
    #[serde(default)]
    source_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    format: CaptionFormat,
    content: String,
    #[serde(default)]
    preset: SegmentPreset,
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    video_id: String,
    title: String,
    chunks_indexed: usize,
}

#[derive(Debug, Serialize)]
struct SourcesResponse {
    sources: Vec<IndexedSource>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Maps library errors to HTTP statuses.
struct ApiError(LecnavError);

impl From<LecnavError> for ApiError {
    fn from(err: LecnavError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_input_error() => StatusCode::BAD_REQUEST,
            LecnavError::SourceNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Rejected request: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

async fn search_timestamps(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> ApiResult<SearchResponse> {
    let query = Query::new(req.query, req.k.unwrap_or(state.default_k)).with_source(req.video_id);
    let results = state.retriever.search(&query).await?;

    Ok(Json(SearchResponse {
        results: results
            .into_iter()
            .map(|hit| TimestampHit {
                video_id: hit.source_id,
                t_start: hit.chunk.start,
                t_end: hit.chunk.end,
                title: hit.source_title,
                snippet: hit.chunk.text.chars().take(SNIPPET_CHARS).collect(),
                score: hit.score,
            })
            .collect(),
    }))
}

async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> ApiResult<IngestResponse> {
    let options = IngestOptions {
        preset: req.preset,
        ..Default::default()
    };
    let result = state
        .ingestor
        .ingest_content(
            &req.content,
            Some(req.format),
            req.source_id.as_deref(),
            req.title.as_deref(),
            &options,
        )
        .await?;

    Ok(Json(IngestResponse {
        video_id: result.source_id,
        title: result.title,
        chunks_indexed: result.chunks_indexed,
    }))
}

async fn list_sources(State(state): State<Arc<AppState>>) -> ApiResult<SourcesResponse> {
    let sources = state.store.list_sources().await?;
    Ok(Json(SourcesResponse {
        total: sources.len(),
        sources,
    }))
}

async fn get_source(
    State(state): State<Arc<AppState>>,
    Path(source_id): Path<String>,
) -> ApiResult<IndexedSource> {
    state
        .store
        .get_source(&source_id)
        .await?
        .map(Json)
        .ok_or_else(|| LecnavError::SourceNotFound(source_id).into())
}
