use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::HitResultDto;
use crate::security::bearer_gate::Identity;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::info;

/// List the caller's results, newest first
///
/// GET /api/results
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<HitResultDto>>, ApiError> {
    let user = identity.require_user()?;

    let results = state
        .ledger
        .list_for_user(user.id)
        .iter()
        .map(HitResultDto::from)
        .collect();

    Ok(Json(results))
}

/// Delete all of the caller's results
///
/// POST /api/results/clear
pub async fn clear_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    let user = identity.require_user()?;

    let removed = state.ledger.clear_for_user(user.id);

    info!(user_id = user.id, removed = removed, "Results cleared");

    Ok(StatusCode::OK)
}
