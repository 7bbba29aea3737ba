use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use telusur_core::persist::{load_engine, load_meta, save_engine, IndexPaths};
use telusur_core::{DocId, Document, Engine, Entities, Error, RebuildReport, SearchMode, SharedEngine};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const SNIPPET_BEFORE: usize = 100;
const SNIPPET_AFTER: usize = 200;
const MAX_K: usize = 100;

type ApiError = (StatusCode, String);

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub mode: Option<String>,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: SearchMode,
    pub took_s: f64,
    /// Matches before truncation to `k`.
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
pub struct SearchResult {
    pub doc_id: DocId,
    pub score: f64,
    pub title: String,
    pub author: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Deserialize)]
pub struct CountParams {
    pub n: Option<usize>,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub doc_id: DocId,
    pub title: String,
    pub sentences: Vec<String>,
}

#[derive(Serialize)]
pub struct Keyword {
    pub term: String,
    pub weight: f64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub document_count: usize,
    pub term_count: usize,
    pub avg_doc_length: f64,
    pub min_df: u32,
    pub created_at: Option<String>,
}

#[derive(Deserialize)]
pub struct RebuildRequest {
    pub min_df: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SharedEngine>,
    pub paths: IndexPaths,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn load(index_dir: impl Into<PathBuf>, admin_token: Option<String>) -> Result<Self> {
        let paths = IndexPaths::new(index_dir.into());
        let engine = load_engine(&paths)?;
        Ok(Self { engine: Arc::new(SharedEngine::new(engine)), paths, admin_token })
    }
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let state = AppState::load(index_dir, admin_token)?;
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/stats", get(stats_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/doc/:doc_id/summary", get(summary_handler))
        .route("/doc/:doc_id/related", get(related_handler))
        .route("/doc/:doc_id/keywords", get(keywords_handler))
        .route("/doc/:doc_id/entities", get(entities_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn api_error(err: Error) -> ApiError {
    let status = match &err {
        Error::UnknownDocument(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) | Error::Configuration(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    (status, err.to_string())
}

fn clamp_k(k: Option<usize>, default: usize) -> usize {
    k.unwrap_or(default).clamp(1, MAX_K)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let mode = match params.mode.as_deref() {
        Some(m) => m.parse::<SearchMode>().map_err(api_error)?,
        None => SearchMode::default(),
    };
    let engine = state.engine.snapshot();
    let k = clamp_k(params.k, engine.config().default_top_k);
    let mut hits = engine.search(&params.q, mode, usize::MAX);
    let total_hits = hits.len();
    hits.truncate(k);

    // Raw query words for highlighting; the stemmed terms rarely occur verbatim.
    let raw_terms: Vec<&str> = params.q.split_whitespace().filter(|t| t.chars().count() >= 2).collect();
    let results: Vec<SearchResult> = hits
        .iter()
        .filter_map(|hit| {
            let doc = engine.document(hit.doc_id).ok()?;
            Some(SearchResult {
                doc_id: hit.doc_id,
                score: hit.score,
                title: doc.title.clone(),
                author: doc.author.clone(),
                date: doc.date.clone(),
                category: doc.category.clone(),
                snippet: snippet(&doc.content, &raw_terms),
            })
        })
        .collect();

    let took_s = start.elapsed().as_secs_f64();
    tracing::info!(query = %params.q, ?mode, total_hits, returned = results.len(), took_s, "search");
    Ok(Json(SearchResponse { query: params.q, mode, took_s, total_hits, results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<Document>, ApiError> {
    let engine = state.engine.snapshot();
    let doc = engine.document(doc_id).map_err(api_error)?;
    Ok(Json(doc.clone()))
}

pub async fn summary_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
    Query(params): Query<CountParams>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let engine = state.engine.snapshot();
    let sentences = engine.summarize(doc_id, params.n.unwrap_or(3)).map_err(api_error)?;
    let title = engine.document(doc_id).map_err(api_error)?.title.clone();
    Ok(Json(SummaryResponse { doc_id, title, sentences }))
}

pub async fn related_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
    Query(params): Query<CountParams>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let engine = state.engine.snapshot();
    let hits = engine.related(doc_id, clamp_k(params.k, 5)).map_err(api_error)?;
    let results = hits
        .iter()
        .filter_map(|hit| {
            let doc = engine.document(hit.doc_id).ok()?;
            Some(SearchResult {
                doc_id: hit.doc_id,
                score: hit.score,
                title: doc.title.clone(),
                author: doc.author.clone(),
                date: doc.date.clone(),
                category: doc.category.clone(),
                snippet: None,
            })
        })
        .collect();
    Ok(Json(results))
}

pub async fn keywords_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
    Query(params): Query<CountParams>,
) -> Result<Json<Vec<Keyword>>, ApiError> {
    let engine = state.engine.snapshot();
    let k = clamp_k(params.k, engine.config().summary_keywords);
    let keywords = engine.keywords(doc_id, k).map_err(api_error)?;
    Ok(Json(keywords.into_iter().map(|(term, weight)| Keyword { term, weight }).collect()))
}

pub async fn entities_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<Entities>, ApiError> {
    let engine = state.engine.snapshot();
    Ok(Json(engine.entities(doc_id).map_err(api_error)?))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let engine = state.engine.snapshot();
    let stats = engine.index_stats();
    let created_at = load_meta(&state.paths).ok().map(|m| m.created_at);
    Json(StatsResponse {
        document_count: stats.document_count,
        term_count: stats.term_count,
        avg_doc_length: stats.avg_doc_length,
        min_df: engine.config().min_df,
        created_at,
    })
}

/// Rebuilds from the stored documents, persists, then publishes. Queries keep
/// using the previous index until the swap; a failure leaves it in place.
async fn rebuild_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RebuildRequest>,
) -> Result<Json<RebuildReport>, ApiError> {
    authorize(&state, &headers)?;
    let shared = state.engine.clone();
    let paths = state.paths.clone();
    let report = tokio::task::spawn_blocking(move || {
        shared.rebuild_with(req.min_df, |next: &Engine| save_engine(&paths, next))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("rebuild task failed: {e}")))?
    .map_err(api_error)?;
    Ok(Json(report))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

fn floor_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// One case-insensitive alternation over all terms, longest first, so every
/// match is found in a single pass over the original text.
fn terms_pattern(terms: &[&str]) -> Option<regex::Regex> {
    let mut terms: Vec<&str> = terms.iter().copied().filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        return None;
    }
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    terms.dedup();
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    regex::RegexBuilder::new(&alternation).case_insensitive(true).build().ok()
}

/// Window around the first occurrence of any query word, or the opening of
/// the text when none occurs, with matches wrapped in `<em>`.
fn snippet(text: &str, raw_terms: &[&str]) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let pattern = terms_pattern(raw_terms);
    let first = pattern.as_ref().and_then(|p| p.find(text)).map(|m| m.start());
    let window = match first {
        Some(idx) => {
            let start = floor_boundary(text, idx.saturating_sub(SNIPPET_BEFORE));
            let end = ceil_boundary(text, (idx + SNIPPET_AFTER).min(text.len()));
            text[start..end].to_string()
        }
        None => text.chars().take(SNIPPET_AFTER).collect(),
    };
    Some(match pattern {
        Some(p) => p.replace_all(&window, "<em>$0</em>").into_owned(),
        None => window,
    })
}
