// HTTP routes configuration

use crate::core::state::AppState;
use crate::security::bearer_gate::bearer_gate;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Public endpoints
        .route("/api/auth/register", post(crate::handlers::auth::register_handler))
        .route("/api/auth/login", post(crate::handlers::auth::login_handler))
        .route("/api/metrics/summary", get(crate::handlers::metrics::summary_handler))
        .route("/health", get(crate::handlers::health::health_handler))

        // Endpoints that need a resolved identity
        .route("/api/area/check", post(crate::handlers::area::check_handler))
        .route("/api/results", get(crate::handlers::results::list_handler))
        .route("/api/results/clear", post(crate::handlers::results::clear_handler))

        // 404 fallback for all unmatched routes
        .fallback(crate::handlers::fallback::fallback_handler)

        // Gate runs first, the counter wraps everything including rejections
        .layer(middleware::from_fn_with_state(state.clone(), bearer_gate))
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))

        .with_state(state)
}

async fn count_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    state.metrics.increment_requests();
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::startup::apply_wal_operations;
    use crate::wal::wal::Wal;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const HASH: &str = "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";

    fn create_test_state(temp_dir: &TempDir) -> Arc<AppState> {
        let wal = Wal::new(temp_dir.path().join("test.wal")).unwrap();
        let config = Config::from_toml("[server]\nport = 8080\n").unwrap();
        Arc::new(AppState::new(config, wal))
    }

    fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn empty_request(method: Method, uri: &str, authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn register(app: &Router, login: &str) -> StatusCode {
        let body = json!({ "login": login, "passwordHash": HASH });
        send(app, json_request(Method::POST, "/api/auth/register", None, body)).await.0
    }

    async fn login(app: &Router, login: &str) -> String {
        let body = json!({ "login": login, "passwordHash": HASH });
        let (status, body) = send(app, json_request(Method::POST, "/api/auth/login", None, body)).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn check(app: &Router, token: &str, x: f64, y: f64, r: i32) -> (StatusCode, Value) {
        let body = json!({ "x": x, "y": y, "r": r });
        send(app, json_request(Method::POST, "/api/area/check", Some(token), body)).await
    }

    async fn list(app: &Router, token: &str) -> Vec<Value> {
        let auth = format!("Bearer {}", token);
        let (status, body) = send(app, empty_request(Method::GET, "/api/results", Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);
        body.as_array().unwrap().clone()
    }

    #[tokio::test]
    async fn test_register_login_check_list_flow() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));

        assert_eq!(register(&app, "alice").await, StatusCode::OK);
        let token = login(&app, "alice").await;
        assert_eq!(token.len(), 48);

        let (status, first) = check(&app, &token, -1.0, 1.0, 2).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["hit"], true);

        let (_, second) = check(&app, &token, 2.5, 2.5, 2).await;
        assert_eq!(second["hit"], false);
        assert_eq!(second["x"], 2.5);
        assert_eq!(second["r"], 2);
        assert!(second["ts"].as_i64().unwrap() > 0);

        let results = list(&app, &token).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], second);
        assert_eq!(results[1], first);
    }

    #[tokio::test]
    async fn test_register_duplicate_login() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));

        assert_eq!(register(&app, "alice").await, StatusCode::OK);

        let body = json!({ "login": "alice", "passwordHash": "0".repeat(64) });
        let (status, body) = send(&app, json_request(Method::POST, "/api/auth/register", None, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Login is already taken");
    }

    #[tokio::test]
    async fn test_register_validation() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));

        let body = json!({ "login": "al", "passwordHash": HASH });
        let (status, _) = send(&app, json_request(Method::POST, "/api/auth/register", None, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let body = json!({ "login": "alice" });
        let (status, _) = send(&app, json_request(Method::POST, "/api/auth/register", None, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_login_bad_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));
        register(&app, "alice").await;

        let body = json!({ "login": "alice", "passwordHash": "f".repeat(64) });
        let (status, body) = send(&app, json_request(Method::POST, "/api/auth/login", None, body)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid login or password");
    }

    #[tokio::test]
    async fn test_relogin_invalidates_previous_token() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));
        register(&app, "alice").await;

        let first = login(&app, "alice").await;
        let second = login(&app, "alice").await;
        assert_ne!(first, second);

        let (status, _) = check(&app, &first, 0.0, 0.0, 1).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = check(&app, &second, 0.0, 0.0, 1).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_header_reaches_handler_anonymous() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));

        let (status, body) = send(&app, empty_request(Method::GET, "/api/results", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authentication required");

        // public routes are unaffected
        let (status, _) = send(&app, empty_request(Method::GET, "/health", None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_non_bearer_header_treated_as_anonymous() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));

        let request = empty_request(Method::GET, "/api/results", Some("Basic dXNlcjpwYXNz"));
        let (status, _) = send(&app, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_token_rejected_before_handler() {
        let temp_dir = TempDir::new().unwrap();
        let state = create_test_state(&temp_dir);
        let app = build_router(state.clone());

        // body is invalid too, the gate answers first
        let body = json!({ "x": 99 });
        let (status, body) = send(&app, json_request(Method::POST, "/api/area/check", Some("feedface"), body)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Invalid session token");
        assert_eq!(state.ledger.total_results(), 0);

        // even public routes refuse an unknown token
        let request = empty_request(Method::GET, "/health", Some("Bearer feedface"));
        assert_eq!(send(&app, request).await.0, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_check_validation() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));
        register(&app, "alice").await;
        let token = login(&app, "alice").await;

        assert_eq!(check(&app, &token, 3.5, 0.0, 1).await.0, StatusCode::BAD_REQUEST);
        assert_eq!(check(&app, &token, 0.0, -3.5, 1).await.0, StatusCode::BAD_REQUEST);
        assert_eq!(check(&app, &token, 0.0, 0.0, 4).await.0, StatusCode::BAD_REQUEST);
        assert!(list(&app, &token).await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_only_own_results() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));
        register(&app, "alice").await;
        register(&app, "bob").await;
        let alice = login(&app, "alice").await;
        let bob = login(&app, "bob").await;

        check(&app, &alice, 0.5, 0.5, 1).await;
        check(&app, &alice, -0.5, 0.5, 1).await;
        check(&app, &bob, 0.1, -0.1, 1).await;

        let auth = format!("Bearer {}", alice);
        let (status, body) = send(&app, empty_request(Method::POST, "/api/results/clear", Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);

        assert!(list(&app, &alice).await.is_empty());
        assert_eq!(list(&app, &bob).await.len(), 1);
    }

    #[tokio::test]
    async fn test_metrics_summary_counts_requests() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));

        send(&app, empty_request(Method::GET, "/health", None)).await;
        send(&app, empty_request(Method::GET, "/api/results", None)).await;

        let (status, body) = send(&app, empty_request(Method::GET, "/api/metrics/summary", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["httpRequests"], 2);
        assert!(body["uptime"].as_f64().unwrap() >= 0.0);
        assert!(body.get("usedMemory").is_some());
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));

        let (status, body) = send(&app, empty_request(Method::GET, "/api/nope", None)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Resource not found");
    }

    #[tokio::test]
    async fn test_state_survives_wal_replay() {
        let temp_dir = TempDir::new().unwrap();
        let app = build_router(create_test_state(&temp_dir));
        register(&app, "alice").await;
        let token = login(&app, "alice").await;
        check(&app, &token, 0.5, 0.5, 1).await;
        check(&app, &token, 2.0, 2.0, 1).await;

        let restored = create_test_state(&temp_dir);
        let operations = restored.wal.replay().unwrap();
        apply_wal_operations(&restored, &operations).unwrap();
        let app = build_router(restored);

        let results = list(&app, &token).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["x"], 2.0);
        assert_eq!(results[0]["hit"], false);

        // registration is durable too
        assert_eq!(register(&app, "alice").await, StatusCode::BAD_REQUEST);
    }
}
