//! Weight route handlers.

use axum::extract::State;
use chrono::Utc;

use patient_dashboard_core::{GoalSnapshot, WeightProgress, WeightRecordId};

use crate::error::Result;
use crate::extract::{IdPath, Payload};
use crate::middleware::RequireAuth;
use crate::models::{GoalsInput, WeightInput, WeightRecord};
use crate::response::{ApiResponse, Created, Empty};
use crate::services::WeightService;
use crate::state::AppState;

/// GET /api/weight
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiResponse<Vec<WeightRecord>>> {
    let records = WeightService::new(state.store()).list(user.id).await?;
    Ok(ApiResponse::list(records))
}

/// POST /api/weight
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Payload(input): Payload<WeightInput>,
) -> Result<Created<WeightRecord>> {
    let record = WeightService::new(state.store())
        .create(user.id, input)
        .await?;
    Ok(Created(record))
}

/// GET /api/weight/{id}
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(id): IdPath<WeightRecordId>,
) -> Result<ApiResponse<WeightRecord>> {
    let record = WeightService::new(state.store()).get(id, user.id).await?;
    Ok(ApiResponse::ok(record))
}

/// PUT /api/weight/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(id): IdPath<WeightRecordId>,
    Payload(input): Payload<WeightInput>,
) -> Result<ApiResponse<WeightRecord>> {
    let record = WeightService::new(state.store())
        .update(id, user.id, input)
        .await?;
    Ok(ApiResponse::ok(record))
}

/// DELETE /api/weight/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(id): IdPath<WeightRecordId>,
) -> Result<ApiResponse<Empty>> {
    WeightService::new(state.store()).delete(id, user.id).await?;
    Ok(ApiResponse::ok(Empty {}))
}

/// GET /api/weight/goals
pub async fn goals(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiResponse<GoalSnapshot>> {
    let snapshot = WeightService::new(state.store()).goals(user.id).await?;
    Ok(ApiResponse::ok(snapshot))
}

/// POST /api/weight/goals
///
/// Appends a record carrying the new goals; history is never rewritten.
pub async fn set_goals(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Payload(input): Payload<GoalsInput>,
) -> Result<Created<WeightRecord>> {
    let record = WeightService::new(state.store())
        .set_goals(user.id, input)
        .await?;
    Ok(Created(record))
}

/// GET /api/weight/progress
pub async fn progress(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiResponse<WeightProgress>> {
    let progress = WeightService::new(state.store())
        .progress(user.id, Utc::now())
        .await?;
    Ok(ApiResponse::ok(progress))
}
