//! Profile route handlers.

use axum::extract::State;

use crate::error::Result;
use crate::extract::Payload;
use crate::middleware::RequireAuth;
use crate::models::{ProfileUpdate, User};
use crate::response::ApiResponse;
use crate::services::ProfileService;
use crate::state::AppState;

/// GET /api/users/profile
pub async fn get_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiResponse<User>> {
    let profile = ProfileService::new(state.store()).get(user.id).await?;
    Ok(ApiResponse::ok(profile))
}

/// PUT /api/users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Payload(update): Payload<ProfileUpdate>,
) -> Result<ApiResponse<User>> {
    let profile = ProfileService::new(state.store())
        .update(user.id, update)
        .await?;
    Ok(ApiResponse::ok(profile))
}
