use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::analysis::{analyze_balance, insight_coverage, BalanceReport, CoverageReport};
use crate::engine::{fingerprint, ClassificationResult, RealmEngine};
use crate::error::{ApiError, ScoringError};
use crate::history::{History, HistoryEntry};
use crate::questions::Selection;
use crate::realm::{profiles, Realm, RealmProfile};
use crate::trio::{lookup_insight, TrioInfo, TrioKey};
use crate::weights::Answer;

const DEFAULT_RECENT: usize = 10;
const MAX_RECENT: usize = 200;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RealmEngine>,
    pub history: Arc<History>,
}

impl AppState {
    pub fn new(engine: RealmEngine, history_capacity: usize) -> Self {
        Self {
            engine: Arc::new(engine),
            history: Arc::new(History::with_capacity(history_capacity)),
        }
    }
}

/// Public routes; `/debug/*` is mounted only when `debug_routes` is set.
pub fn create_router(state: AppState, debug_routes: bool) -> Router {
    let mut router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/realms", get(list_realms))
        .route("/questions", get(list_questions))
        .route("/classify", post(classify))
        .route("/quiz/submit", post(submit))
        .route("/trio/{a}/{b}/{c}", get(trio));

    if debug_routes {
        router = router
            .route("/debug/balance", get(debug_balance))
            .route("/debug/coverage", get(debug_coverage))
            .route("/debug/recent", get(debug_recent));
    }

    router
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn list_realms() -> Json<&'static [RealmProfile]> {
    Json(profiles())
}

// serialized straight from the shared bank
async fn list_questions(State(state): State<AppState>) -> Response {
    Json(state.engine.questions()).into_response()
}

async fn classify(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Answer>>, JsonRejection>,
) -> Result<Json<ClassificationResult>, ApiError> {
    let Json(answers) = payload?;
    Ok(Json(record(&state, &answers)?))
}

async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Selection>>, JsonRejection>,
) -> Result<Json<ClassificationResult>, ApiError> {
    let Json(selections) = payload?;
    let answers = state.engine.questions().resolve_all(&selections)?;
    Ok(Json(record(&state, &answers)?))
}

fn record(state: &AppState, answers: &[Answer]) -> Result<ClassificationResult, ScoringError> {
    let result = state.engine.classify(answers)?;
    state.history.push(&result);
    info!(
        answers = answers.len(),
        fingerprint = %fingerprint(answers),
        primary = %result.primary_realm,
        trio = %result.trio.key,
        confidence = result.confidence.as_str(),
        "classified"
    );
    Ok(result)
}

async fn trio(
    State(state): State<AppState>,
    Path((a, b, c)): Path<(String, String, String)>,
) -> Result<Json<TrioInfo>, ApiError> {
    let key = TrioKey::new(a.parse::<Realm>()?, b.parse::<Realm>()?, c.parse::<Realm>()?)?;
    Ok(Json(lookup_insight(key, state.engine.insights())))
}

async fn debug_balance(State(state): State<AppState>) -> Json<BalanceReport> {
    Json(analyze_balance(state.engine.questions()))
}

async fn debug_coverage(State(state): State<AppState>) -> Json<CoverageReport> {
    Json(insight_coverage(state.engine.insights()))
}

#[derive(serde::Deserialize)]
struct RecentParams {
    n: Option<usize>,
}

async fn debug_recent(
    State(state): State<AppState>,
    Query(q): Query<RecentParams>,
) -> Json<Vec<HistoryEntry>> {
    let n = q.n.unwrap_or(DEFAULT_RECENT).min(MAX_RECENT);
    Json(state.history.snapshot_last_n(n))
}
