// src/config.rs
//! Service configuration: optional TOML file, then environment overrides.
//!
//! Resolution order:
//! 1) `$REALMS_CONFIG_PATH`, else `config/realms.toml` (missing file → defaults)
//! 2) env overrides: `REALMS_INSIGHTS_PATH`, `REALMS_QUESTIONS_PATH`,
//!    `REALMS_HISTORY_CAP`, `DEBUG_ROUTES`, `METRICS_ENABLED`
//!
//! Out-of-range values are sanitized back to defaults instead of failing.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::questions::QuestionBank;
use crate::trio::InsightTable;

pub const DEFAULT_CONFIG_PATH: &str = "config/realms.toml";
pub const ENV_CONFIG_PATH: &str = "REALMS_CONFIG_PATH";
pub const ENV_INSIGHTS_PATH: &str = "REALMS_INSIGHTS_PATH";
pub const ENV_QUESTIONS_PATH: &str = "REALMS_QUESTIONS_PATH";
pub const ENV_HISTORY_CAP: &str = "REALMS_HISTORY_CAP";
pub const ENV_DEBUG_ROUTES: &str = "DEBUG_ROUTES";
pub const ENV_METRICS_ENABLED: &str = "METRICS_ENABLED";

const MAX_HISTORY_CAP: usize = 10_000;

fn default_history_cap() -> usize {
    500
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Load trio insights from this JSON file instead of the embedded table.
    #[serde(default)]
    pub insights_path: Option<PathBuf>,
    /// Load questions from this JSON file instead of the embedded bank.
    #[serde(default)]
    pub questions_path: Option<PathBuf>,
    #[serde(default = "default_history_cap")]
    pub history_capacity: usize,
    /// Mount `/debug/*` routes.
    #[serde(default)]
    pub debug_routes: bool,
    /// Install the Prometheus recorder and mount `/metrics`.
    #[serde(default)]
    pub metrics_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            insights_path: None,
            questions_path: None,
            history_capacity: default_history_cap(),
            debug_routes: false,
            metrics_enabled: false,
        }
    }
}

impl AppConfig {
    /// File (if present) + env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
            if pb.exists() {
                Self::load_from_file(&pb)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env();
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut cfg: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Some(p) = non_empty_env(ENV_INSIGHTS_PATH) {
            self.insights_path = Some(PathBuf::from(p));
        }
        if let Some(p) = non_empty_env(ENV_QUESTIONS_PATH) {
            self.questions_path = Some(PathBuf::from(p));
        }
        if let Some(cap) = non_empty_env(ENV_HISTORY_CAP).and_then(|s| s.trim().parse().ok()) {
            self.history_capacity = cap;
        }
        if let Some(v) = non_empty_env(ENV_DEBUG_ROUTES) {
            self.debug_routes = parse_flag(&v);
        }
        if let Some(v) = non_empty_env(ENV_METRICS_ENABLED) {
            self.metrics_enabled = parse_flag(&v);
        }
    }

    fn sanitize(&mut self) {
        if self.history_capacity == 0 || self.history_capacity > MAX_HISTORY_CAP {
            self.history_capacity = default_history_cap();
        }
    }

    /// Insight table: from `insights_path`, else the embedded one.
    pub fn insight_table(&self) -> Result<Arc<InsightTable>> {
        match &self.insights_path {
            Some(p) => {
                let table = InsightTable::load_from_file(p)?;
                info!(path = %p.display(), records = table.len(), "loaded trio insights");
                Ok(Arc::new(table))
            }
            None => Ok(InsightTable::embedded()),
        }
    }

    /// Question bank: from `questions_path`, else the embedded one.
    pub fn question_bank(&self) -> Result<Arc<QuestionBank>> {
        match &self.questions_path {
            Some(p) => {
                let bank = QuestionBank::load_from_file(p)?;
                info!(path = %p.display(), questions = bank.len(), "loaded question bank");
                Ok(Arc::new(bank))
            }
            None => Ok(QuestionBank::embedded()),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
