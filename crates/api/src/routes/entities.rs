//! Tracked entity registration and containment state.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use domain::models::containment::ContainmentStateResponse;
use domain::models::entity::CreateEntityRequest;
use domain::models::{EntityId, TrackedEntity};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ApiJson;

/// Looks up an entity, mapping absence to `unknown_entity`.
pub(crate) async fn require_entity(
    state: &AppState,
    entity_id: &EntityId,
) -> Result<TrackedEntity, ApiError> {
    state
        .catalog
        .get_entity(entity_id)
        .await?
        .ok_or_else(|| ApiError::UnknownEntity(entity_id.to_string()))
}

/// Register a tracked entity.
///
/// POST /api/v1/entities
pub async fn create_entity(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateEntityRequest>,
) -> Result<(StatusCode, Json<TrackedEntity>), ApiError> {
    let request = request.normalized();
    request.validate_all()?;

    let entity_id = EntityId::new(request.entity_id);
    let entity = state
        .catalog
        .create_entity(&entity_id, &request.name)
        .await?;

    info!(entity_id = %entity.entity_id, "Tracked entity registered");
    Ok((StatusCode::CREATED, Json(entity)))
}

/// GET /api/v1/entities/:entity_id
pub async fn get_entity(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> Result<Json<TrackedEntity>, ApiError> {
    let entity = require_entity(&state, &EntityId::new(entity_id)).await?;
    Ok(Json(entity))
}

/// Persisted per-boundary containment for an entity.
///
/// GET /api/v1/entities/:entity_id/containment
pub async fn get_containment_state(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> Result<Json<ContainmentStateResponse>, ApiError> {
    let entity_id = EntityId::new(entity_id);
    require_entity(&state, &entity_id).await?;

    let containment = state.catalog.containment_state(&entity_id).await?;
    Ok(Json(containment.into()))
}
