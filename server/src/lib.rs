use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use temu_core::config::DEFAULT_TOP_K;
use temu_core::persist::{load_index, IndexPaths};
use temu_core::{IndexedCorpus, QueryStatus, SearchEngine, SearchError, SearchResult};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_TOP_K }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub normalized: String,
    pub status: QueryStatus,
    pub took_ms: u128,
    pub took_s: f64,
    /// Candidates found by the inverted index before re-ranking.
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
}

type ApiError = (StatusCode, Json<Value>);

#[derive(Clone)]
pub struct AppState {
    pub index_paths_root: PathBuf,
    pub engine: Arc<RwLock<SearchEngine>>,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Current generation; the lock is held only long enough to clone the handle.
    fn snapshot(&self) -> Result<Arc<IndexedCorpus>, ApiError> {
        self.engine.read().snapshot().map_err(search_error)
    }
}

fn search_error(err: SearchError) -> ApiError {
    let status = match err {
        SearchError::NotIndexed => StatusCode::SERVICE_UNAVAILABLE,
        SearchError::EmptyCorpus => StatusCode::UNPROCESSABLE_ENTITY,
        SearchError::RecordBatch { .. } => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({ "error": err.to_string() })))
}

fn open_engine(index_dir: &str) -> SearchEngine {
    let mut engine = SearchEngine::default();
    match load_index(&IndexPaths::new(index_dir)) {
        Ok((corpus, meta)) => {
            tracing::info!(index_dir, num_docs = meta.num_docs, created_at = %meta.created_at, "loaded index");
            engine.install(corpus);
        }
        Err(e) => tracing::warn!(index_dir, error = %format!("{e:#}"), "no usable index; starting uninitialized"),
    }
    engine
}

/// Whether the engine came up with a persisted index, and how large it is.
pub fn index_status(app_state: &AppState) -> Option<usize> {
    app_state.snapshot().ok().map(|corpus| corpus.store().len())
}

pub fn build_app(index_dir: String, admin_token: Option<String>) -> Result<Router> {
    let (app, _) = build_app_with_state(index_dir, admin_token)?;
    Ok(app)
}

pub fn build_app_with_state(index_dir: String, admin_token: Option<String>) -> Result<(Router, AppState)> {
    let engine = open_engine(&index_dir);
    let app_state = AppState {
        index_paths_root: PathBuf::from(&index_dir),
        engine: Arc::new(RwLock::new(engine)),
        admin_token,
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:id", get(doc_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok((app, app_state))
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let corpus = state.snapshot()?;
    let k = params.k.clamp(1, MAX_K);
    let report = corpus.explain(&params.q, k);

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: report.query,
        normalized: report.normalized,
        status: report.status,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        total_hits: report.candidates,
        results: report.results,
    }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let corpus = state.snapshot()?;
    match corpus.store().get_by_id(&id) {
        Some(doc) => Ok(Json(json!(doc))),
        None => Err((StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))),
    }
}

/// Re-read the persisted index and swap it in. Searches already holding the
/// previous generation finish against it.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;
    let paths = IndexPaths::new(&state.index_paths_root);
    let loaded = tokio::task::spawn_blocking(move || load_index(&paths))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))))?;
    let (corpus, meta) = loaded.map_err(|e| {
        tracing::warn!(error = %format!("{e:#}"), "index reload failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": format!("{e:#}") })))
    })?;
    state.engine.write().install(corpus);
    tracing::info!(num_docs = meta.num_docs, "index reloaded");
    Ok(Json(json!({ "num_docs": meta.num_docs, "created_at": meta.created_at })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, Json(json!({ "error": "ADMIN_TOKEN not set" })))),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid admin token" }))))
    }
}
