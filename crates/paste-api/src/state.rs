//! Application state

use paste_core::PasteEngine;
use std::sync::Arc;
use std::time::Instant;

/// Handle used to render the Prometheus exposition
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PasteEngine>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(engine: Arc<PasteEngine>) -> Self {
        Self {
            engine,
            started_at: Instant::now(),
        }
    }
}
