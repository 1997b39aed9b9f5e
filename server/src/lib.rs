use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use engine::persist::{load_index, IndexPaths};
use engine::rank::Model;
use engine::{DocTags, SearchEngine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_model() -> String {
    "bm25".to_string()
}

fn default_k() -> usize {
    10
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub model: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f32,
    pub title: String,
    pub tags: Option<DocTags>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

/// Load a persisted index and build the router around it.
pub fn build_app(index_dir: impl AsRef<std::path::Path>) -> Result<Router> {
    let index = load_index(&IndexPaths::new(&index_dir))?;
    tracing::info!(
        dir = %index_dir.as_ref().display(),
        num_docs = index.num_docs(),
        "index loaded"
    );
    Ok(build_router(SearchEngine::new(index)))
}

pub fn build_router(engine: SearchEngine) -> Router {
    let state = AppState {
        engine: Arc::new(engine),
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(state)
        .layer(cors)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let model = Model::from_selector(&params.model)
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;

    let hits = state
        .engine
        .search(&params.q, &model, params.k)
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;

    let results: Vec<SearchHit> = hits
        .into_iter()
        .map(|h| SearchHit {
            doc_id: h.doc_id,
            score: h.score,
            title: h.title,
            tags: h.tags,
        })
        .collect();

    Ok(Json(SearchResponse {
        query: params.q,
        model: params.model,
        took_s: start.elapsed().as_secs_f64(),
        total_hits: results.len(),
        results,
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let index = state.engine.index();
    let internal = index.internal_id(&doc_id).ok_or(StatusCode::NOT_FOUND)?;
    let meta = index.meta(internal);
    Ok(Json(serde_json::json!({
        "doc_id": meta.external_id,
        "title": meta.title,
        "tags": meta.tags,
        "length": index.document_length(internal),
    })))
}
