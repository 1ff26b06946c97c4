//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (store ping)
//!
//! # Auth (register and login rate limited)
//! POST /api/auth/register      - Create account, issue token
//! POST /api/auth/login         - Issue token
//! GET  /api/auth/me            - Current user
//! POST /api/auth/logout        - Revoke presented token
//!
//! # Records (bearer token required)
//! GET|POST        /api/medications
//! GET|PUT|DELETE  /api/medications/{id}
//! GET|POST        /api/shipments
//! GET|PUT|DELETE  /api/shipments/{id}
//! GET|POST        /api/weight
//! GET|POST        /api/weight/goals
//! GET             /api/weight/progress
//! GET|PUT|DELETE  /api/weight/{id}
//! GET|PUT         /api/users/profile
//! ```

pub mod auth;
pub mod medications;
pub mod shipments;
pub mod users;
pub mod weight;

use axum::{
    Router,
    extract::State,
    http::{
        HeaderValue, Method, StatusCode, Uri,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Build the complete application router, layers included.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state);

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/auth", auth_routes(state.config().rate_limit))
        .nest("/api/medications", medication_routes())
        .nest("/api/shipments", shipment_routes())
        .nest("/api/weight", weight_routes())
        .nest("/api/users", user_routes())
        .fallback(not_found);

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Create the auth routes router.
///
/// Only the credential endpoints are rate limited.
fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let credentials = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));
    let credentials = if rate_limit {
        credentials.layer(auth_rate_limiter())
    } else {
        credentials
    };

    Router::new()
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .merge(credentials)
}

fn medication_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(medications::list).post(medications::create))
        .route(
            "/{id}",
            get(medications::get)
                .put(medications::update)
                .delete(medications::delete),
        )
}

fn shipment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shipments::list).post(shipments::create))
        .route(
            "/{id}",
            get(shipments::get)
                .put(shipments::update)
                .delete(shipments::delete),
        )
}

fn weight_routes() -> Router<AppState> {
    // Static segments win over `{id}` regardless of order
    Router::new()
        .route("/", get(weight::list).post(weight::create))
        .route("/goals", get(weight::goals).post(weight::set_goals))
        .route("/progress", get(weight::progress))
        .route(
            "/{id}",
            get(weight::get).put(weight::update).delete(weight::delete),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new().route(
        "/profile",
        get(users::get_profile).put(users::update_profile),
    )
}

/// CORS for the configured frontend origin, with credentials.
fn cors_layer(state: &AppState) -> Option<CorsLayer> {
    let origin = state.config().frontend_url.as_ref()?.origin().ascii_serialization();
    let origin = HeaderValue::from_str(&origin).ok()?;

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
    )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Not found - {}", uri.path()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ApiConfig;
    use crate::db::Store;

    fn test_app() -> Router {
        app_with_rate_limit(false)
    }

    fn app_with_rate_limit(enabled: bool) -> Router {
        let config = ApiConfig::from_lookup(|key| match key {
            "PD_STORE" => Some("memory".to_string()),
            "PD_RATE_LIMIT" => Some(enabled.to_string()),
            _ => None,
        })
        .unwrap();
        app(AppState::new(config, Store::memory()))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn register(app: &Router) -> String {
        let request = Request::post("/api/auth/register")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"name": "Sam", "email": "sam@example.com", "password": "password123"})
                    .to_string(),
            ))
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_sets_security_and_request_id_headers() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["cache-control"], "no-store, max-age=0");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_readiness_with_memory_store() {
        let (status, _) = send(
            &test_app(),
            Request::get("/health/ready").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_uses_envelope() {
        let (status, body) = send(
            &test_app(),
            Request::get("/api/nothing").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Not found - /api/nothing");
    }

    #[tokio::test]
    async fn test_missing_and_bad_tokens_are_unauthorized() {
        let app = test_app();

        let (status, body) = send(
            &app,
            Request::get("/api/medications").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized, no token");

        let (status, body) = send(
            &app,
            Request::get("/api/medications")
                .header(AUTHORIZATION, "Bearer forged")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized, token failed");
    }

    #[tokio::test]
    async fn test_rate_limit_covers_only_credential_endpoints() {
        let app = app_with_rate_limit(true);

        for _ in 0..10 {
            let (status, _) = send(
                &app,
                Request::get("/api/auth/me")
                    .header("x-forwarded-for", "203.0.113.7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let mut statuses = Vec::new();
        for _ in 0..10 {
            let (status, _) = send(
                &app,
                Request::post("/api/auth/login")
                    .header("x-forwarded-for", "203.0.113.7")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"email": "", "password": ""}).to_string()))
                    .unwrap(),
            )
            .await;
            statuses.push(status);
        }
        assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
        assert_ne!(statuses[0], StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_bad_id_and_bad_json_are_bad_requests() {
        let app = test_app();
        let token = register(&app).await;
        let bearer = format!("Bearer {token}");

        let (status, body) = send(
            &app,
            Request::get("/api/weight/abc")
                .header(AUTHORIZATION, &bearer)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid id");

        let (status, body) = send(
            &app,
            Request::post("/api/medications")
                .header(AUTHORIZATION, &bearer)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_static_weight_routes_win_over_id() {
        let app = test_app();
        let token = register(&app).await;

        let (status, body) = send(
            &app,
            Request::get("/api/weight/goals")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["weightChange"], 0.0);
    }
}
