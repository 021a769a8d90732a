use crate::area::predicate::is_hit;
use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::{CheckRequest, HitResultDto};
use crate::security::bearer_gate::Identity;
use crate::utils::time::current_timestamp_millis;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;

/// Test a point against the area and record the outcome
///
/// POST /api/area/check {x, y, r}
pub async fn check_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<HitResultDto>, ApiError> {
    let user = identity.require_user()?;
    let Json(request) = payload?;
    let point = request.validate()?;

    let hit = is_hit(point.x, point.y, point.r);
    let result = state.ledger.record(
        user.id,
        point.x,
        point.y,
        point.r,
        hit,
        current_timestamp_millis(),
    );

    debug!(
        user_id = user.id,
        x = point.x,
        y = point.y,
        r = point.r,
        hit = hit,
        "Point checked"
    );

    Ok(Json(HitResultDto::from(&result)))
}
