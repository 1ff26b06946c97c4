//! Authentication route handlers.

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::extract::Payload;
use crate::middleware::{BearerToken, RequireAuth};
use crate::models::{CurrentUser, IssuedToken, User};
use crate::response::{ApiResponse, Created, Empty};
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A new bearer token with the account it belongs to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl AuthPayload {
    fn new(user: User, issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        }
    }
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Payload(body): Payload<RegisterRequest>,
) -> Result<Created<AuthPayload>> {
    let (user, issued) = state
        .auth()
        .register(&body.name, &body.email, &body.password)
        .await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(Created(AuthPayload::new(user, issued)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Payload(body): Payload<LoginRequest>,
) -> Result<ApiResponse<AuthPayload>> {
    let (user, issued) = state.auth().login(&body.email, &body.password).await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(ApiResponse::ok(AuthPayload::new(user, issued)))
}

/// GET /api/auth/me
pub async fn me(RequireAuth(user): RequireAuth) -> ApiResponse<CurrentUser> {
    ApiResponse::ok(user)
}

/// POST /api/auth/logout
///
/// Revokes only the presented token; other sessions stay valid.
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    BearerToken(token): BearerToken,
) -> Result<ApiResponse<Empty>> {
    state.auth().logout(&token).await?;
    clear_sentry_user();
    Ok(ApiResponse::ok(Empty {}))
}
