//! Realm classifier service.
//! Routes, config variables and the `.env` convention are listed in `README.md`.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEV_LOG_ENV: &str = "REALMS_DEV_LOG";
const DEFAULT_FILTER: &str = "realm_classifier=info,insights=warn,warn";

/// `REALMS_DEV_LOG=1` in a debug build or a local/dev Shuttle environment.
fn dev_logging_requested() -> bool {
    if std::env::var(DEV_LOG_ENV).as_deref() != Ok("1") {
        return false;
    }
    let shuttle_env = std::env::var("SHUTTLE_ENV")
        .unwrap_or_default()
        .to_ascii_lowercase();
    cfg!(debug_assertions) || matches!(shuttle_env.as_str(), "local" | "development" | "dev")
}

fn init_tracing() {
    if !dev_logging_requested() {
        return;
    }
    // RUST_LOG wins over the built-in filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(true))
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    let _ = dotenvy::dotenv();
    init_tracing();

    let router = realm_classifier::app().map_err(shuttle_runtime::Error::Custom)?;
    Ok(router.into())
}
