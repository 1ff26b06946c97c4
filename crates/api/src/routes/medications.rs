//! Medication route handlers.

use axum::extract::State;

use patient_dashboard_core::MedicationId;

use crate::error::Result;
use crate::extract::{Filters, IdPath, Payload};
use crate::middleware::RequireAuth;
use crate::models::{Medication, MedicationFilter, MedicationInput};
use crate::response::{ApiResponse, Created, Empty};
use crate::services::MedicationService;
use crate::state::AppState;

/// GET /api/medications
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Filters(filter): Filters<MedicationFilter>,
) -> Result<ApiResponse<Vec<Medication>>> {
    let medications = MedicationService::new(state.store())
        .list(user.id, &filter)
        .await?;
    Ok(ApiResponse::list(medications))
}

/// POST /api/medications
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Payload(input): Payload<MedicationInput>,
) -> Result<Created<Medication>> {
    let medication = MedicationService::new(state.store())
        .create(user.id, input)
        .await?;
    Ok(Created(medication))
}

/// GET /api/medications/{id}
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(id): IdPath<MedicationId>,
) -> Result<ApiResponse<Medication>> {
    let medication = MedicationService::new(state.store()).get(id, user.id).await?;
    Ok(ApiResponse::ok(medication))
}

/// PUT /api/medications/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(id): IdPath<MedicationId>,
    Payload(input): Payload<MedicationInput>,
) -> Result<ApiResponse<Medication>> {
    let medication = MedicationService::new(state.store())
        .update(id, user.id, input)
        .await?;
    Ok(ApiResponse::ok(medication))
}

/// DELETE /api/medications/{id}
///
/// Shipments of the medication are left in place.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(id): IdPath<MedicationId>,
) -> Result<ApiResponse<Empty>> {
    MedicationService::new(state.store())
        .delete(id, user.id)
        .await?;
    Ok(ApiResponse::ok(Empty {}))
}
