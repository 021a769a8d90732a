use crate::models::hit_result::HitResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub login: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub login: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub r: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Public view of a stored check, without internal IDs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitResultDto {
    pub x: f64,
    pub y: f64,
    pub r: i32,
    pub hit: bool,
    pub ts: i64,
}

impl From<&HitResult> for HitResultDto {
    fn from(result: &HitResult) -> Self {
        Self {
            x: result.x,
            y: result.y,
            r: result.r,
            hit: result.hit,
            ts: result.ts,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
