use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::{AuthResponse, LoginRequest, RegisterRequest};
use crate::utils::time::current_timestamp_millis;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Create an account
///
/// POST /api/auth/register {login, passwordHash}
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload?;
    let credentials = request.validate()?;

    let user = state
        .user_store
        .register(&credentials.login, &credentials.password_hash)
        .inspect_err(|_| warn!(login = %credentials.login, "Registration with taken login"))?;

    info!(user_id = user.id, login = %user.login, "User registered");

    Ok(StatusCode::OK)
}

/// Exchange credentials for a fresh session token
///
/// POST /api/auth/login {login, passwordHash}
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(request) = payload?;
    let credentials = request.validate()?;

    let user = state
        .user_store
        .login(
            &credentials.login,
            &credentials.password_hash,
            current_timestamp_millis(),
        )
        .inspect_err(|_| warn!(login = %credentials.login, "Failed login attempt"))?;

    let token = user.token.ok_or(ApiError::InvalidCredentials)?;

    info!(user_id = user.id, "Session token issued");

    Ok(Json(AuthResponse { token }))
}
