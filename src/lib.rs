// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod analysis;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod metrics;
pub mod questions;
pub mod realm;
pub mod scoring;
pub mod trio;
pub mod weights;

// ---- Re-exports for stable public API ----
pub use crate::engine::{assemble, ClassificationResult, RealmEngine};
pub use crate::error::{ApiError, ScoringError};
pub use crate::realm::{Realm, RealmScores};
pub use crate::scoring::Confidence;
pub use crate::trio::{InsightLookup, InsightRecord, InsightTable, TrioInfo, TrioKey};
pub use crate::weights::{Answer, AnswerValue, WeightMap};

use axum::Router;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::AppConfig;
use crate::metrics::Metrics;

/// Build the full router from `AppConfig::load()` (file + env).
pub fn app() -> anyhow::Result<Router> {
    app_with(&AppConfig::load()?)
}

/// Build the full router from an explicit config.
pub fn app_with(cfg: &AppConfig) -> anyhow::Result<Router> {
    let engine = RealmEngine::new(cfg.insight_table()?, cfg.question_bank()?);
    let missing = engine.insights().missing_keys().len();
    info!(
        questions = engine.questions().len(),
        insights = engine.insights().len(),
        missing_insights = missing,
        debug_routes = cfg.debug_routes,
        metrics = cfg.metrics_enabled,
        "realm engine ready"
    );

    let state = AppState::new(engine, cfg.history_capacity);
    let mut router = create_router(state, cfg.debug_routes);
    if cfg.metrics_enabled {
        router = router.merge(Metrics::init()?.router());
    }
    Ok(router)
}
