//! Boundary registration endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::boundary::{CreateBoundaryRequest, ListBoundariesResponse};
use domain::models::{Boundary, BoundaryPolygon, EntityId};
use domain::services::geometry::{validate_polygon, vertex_count};
use domain::store::StoreError;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ApiJson;
use crate::routes::entities::require_entity;

/// Upper bound on vertices across all rings of one boundary.
pub const MAX_BOUNDARY_VERTICES: usize = 10_000;

/// Runs the same checks evaluation applies, so a stored boundary is never
/// skipped as malformed later.
fn check_boundary(entity_id: &EntityId, request: &CreateBoundaryRequest) -> Result<(), ApiError> {
    let polygon = BoundaryPolygon::from_geojson(
        Uuid::nil(),
        entity_id.clone(),
        request.name.as_str(),
        &request.boundary_geojson,
    )
    .map_err(|e| ApiError::InvalidBoundary(e.to_string()))?;

    let vertices = vertex_count(&polygon);
    if vertices > MAX_BOUNDARY_VERTICES {
        return Err(ApiError::InvalidBoundary(format!(
            "boundary has {vertices} vertices, at most {MAX_BOUNDARY_VERTICES} are allowed"
        )));
    }

    validate_polygon(&polygon).map_err(|e| ApiError::InvalidBoundary(e.to_string()))
}

/// POST /api/v1/entities/:entity_id/boundaries
pub async fn create_boundary(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
    ApiJson(request): ApiJson<CreateBoundaryRequest>,
) -> Result<(StatusCode, Json<Boundary>), ApiError> {
    let request = request.normalized();
    request.validate()?;

    let entity_id = EntityId::new(entity_id);
    check_boundary(&entity_id, &request)?;

    let boundary = state
        .catalog
        .create_boundary(&entity_id, &request.name, &request.boundary_geojson)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => ApiError::UnknownEntity(entity_id.to_string()),
            other => other.into(),
        })?;

    info!(
        entity_id = %boundary.entity_id,
        boundary_id = %boundary.boundary_id,
        "Boundary registered"
    );
    Ok((StatusCode::CREATED, Json(boundary)))
}

/// GET /api/v1/entities/:entity_id/boundaries
pub async fn list_boundaries(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> Result<Json<ListBoundariesResponse>, ApiError> {
    let entity_id = EntityId::new(entity_id);
    require_entity(&state, &entity_id).await?;

    let boundaries = state.catalog.list_boundaries(&entity_id).await?;
    Ok(Json(ListBoundariesResponse {
        total: boundaries.len(),
        boundaries,
    }))
}

/// DELETE /api/v1/boundaries/:boundary_id
pub async fn delete_boundary(
    State(state): State<AppState>,
    Path(boundary_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.catalog.delete_boundary(boundary_id).await? {
        return Err(ApiError::NotFound(format!(
            "Boundary '{boundary_id}' not found"
        )));
    }

    info!(boundary_id = %boundary_id, "Boundary deleted");
    Ok(StatusCode::NO_CONTENT)
}
