use anyhow::{anyhow, Result};
use axum::{extract::State, routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::realm::REALM_COUNT;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and describe the counters.
    /// Later calls reuse the first handle.
    pub fn init() -> Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new()
                    .install_recorder()
                    .map_err(|e| anyhow!("prometheus: install recorder: {e}"))?;

                describe_counter!(
                    "realm_results_total",
                    "Classifications by primary realm and confidence"
                );
                describe_counter!(
                    "realm_insight_fallback_total",
                    "Trio lookups that fell back to the generic insight"
                );
                gauge!("realm_registry_size").set(REALM_COUNT as f64);
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();

        Ok(Self { handle })
    }

    /// `GET /metrics` in Prometheus text format.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(render))
            .with_state(self.handle.clone())
    }
}

async fn render(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
