//! Authentication extractors.
//!
//! The caller's identity travels with the request: handlers that need it take
//! a [`RequireAuth`] argument, which resolves the `Authorization: Bearer`
//! header against the session store.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::state::AppState;

const NO_TOKEN: &str = "Not authorized, no token";

/// Extractor that requires a valid bearer token.
///
/// Rejects with `401` and the standard error envelope.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        let user = state.auth().authenticate(&token).await?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        Ok(Self(user))
    }
}

/// The raw bearer token presented with the request.
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers)
            .map(|token| Self(token.to_owned()))
            .ok_or_else(|| AppError::Unauthorized(NO_TOKEN.to_owned()))
    }
}

/// The token from an `Authorization: Bearer <token>` header, if present.
///
/// The scheme is matched case-insensitively.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
