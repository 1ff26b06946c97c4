//! Shipment route handlers.
//!
//! Every shipment is returned as a view with its medication populated (null
//! once the medication is deleted) and a carrier guessed from the tracking
//! number.

use axum::extract::State;

use patient_dashboard_core::ShipmentId;

use crate::error::Result;
use crate::extract::{Filters, IdPath, Payload};
use crate::middleware::RequireAuth;
use crate::models::{ShipmentFilter, ShipmentInput, ShipmentView};
use crate::response::{ApiResponse, Created, Empty};
use crate::services::ShipmentService;
use crate::state::AppState;

/// GET /api/shipments
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Filters(filter): Filters<ShipmentFilter>,
) -> Result<ApiResponse<Vec<ShipmentView>>> {
    let shipments = ShipmentService::new(state.store())
        .list(user.id, &filter)
        .await?;
    Ok(ApiResponse::list(shipments))
}

/// POST /api/shipments
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Payload(input): Payload<ShipmentInput>,
) -> Result<Created<ShipmentView>> {
    let shipment = ShipmentService::new(state.store())
        .create(user.id, input)
        .await?;
    Ok(Created(shipment))
}

/// GET /api/shipments/{id}
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(id): IdPath<ShipmentId>,
) -> Result<ApiResponse<ShipmentView>> {
    let shipment = ShipmentService::new(state.store()).get(id, user.id).await?;
    Ok(ApiResponse::ok(shipment))
}

/// PUT /api/shipments/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(id): IdPath<ShipmentId>,
    Payload(input): Payload<ShipmentInput>,
) -> Result<ApiResponse<ShipmentView>> {
    let shipment = ShipmentService::new(state.store())
        .update(id, user.id, input)
        .await?;
    Ok(ApiResponse::ok(shipment))
}

/// DELETE /api/shipments/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(id): IdPath<ShipmentId>,
) -> Result<ApiResponse<Empty>> {
    ShipmentService::new(state.store()).delete(id, user.id).await?;
    Ok(ApiResponse::ok(Empty {}))
}
