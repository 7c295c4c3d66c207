//! Liveness endpoints

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

/// GET /health, GET /healthz
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    metrics::counter!("pastebin_health_checks_total").increment(1);

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub fn routes() -> Router<AppState> {
    ["/health", "/healthz"]
        .into_iter()
        .fold(Router::new(), |router, path| router.route(path, get(health)))
}
