//! Bearer token gate.
//!
//! Runs in front of every route. A request without a usable
//! `Authorization: Bearer` header continues as [`Identity::Anonymous`];
//! a request carrying a token that no user holds is answered with 403
//! before any handler sees it. Resolved identities travel in the request
//! extensions and are read back through the [`Identity`] extractor.

use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::user::User;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

const BEARER_PREFIX: &str = "Bearer ";

/// Who is making the request
#[derive(Clone, Debug, PartialEq)]
pub enum Identity {
    Anonymous,
    User(User),
}

impl Identity {
    /// The authenticated user, or 401 for anonymous requests
    pub fn require_user(self) -> Result<User, ApiError> {
        match self {
            Identity::User(user) => Ok(user),
            Identity::Anonymous => Err(ApiError::Unauthenticated),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Identity>()
            .cloned()
            .unwrap_or(Identity::Anonymous))
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
///
/// Anything else, including a header that is not valid UTF-8 or uses
/// another scheme, counts as no credentials at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        // non-ASCII tokens can never match an issued hex token
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
}

pub async fn bearer_gate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = match bearer_token(request.headers()) {
        None => Identity::Anonymous,
        Some(token) => match state.user_store.find_by_token(token) {
            Some(user) => {
                debug!(user_id = user.id, "Bearer token resolved");
                Identity::User(user)
            }
            None => {
                warn!(path = %request.uri().path(), "Rejected unknown bearer token");
                return ApiError::Forbidden.into_response();
            }
        },
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}
