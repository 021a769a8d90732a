// Metrics summary endpoint

use crate::core::state::AppState;
use crate::metrics::collector::MetricsSummary;
use axum::{extract::State, Json};
use std::sync::Arc;

/// Returns uptime, resident memory and the number of served HTTP requests.
///
/// GET /api/metrics/summary
pub async fn summary_handler(State(state): State<Arc<AppState>>) -> Json<MetricsSummary> {
    Json(state.metrics.summary())
}
