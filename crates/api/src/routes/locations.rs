//! Location ingestion and history endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use domain::models::location::{
    BatchUploadRequest, LocationHistoryQuery, LocationHistoryResponse, RawLocationSample,
};
use domain::models::EntityId;
use domain::services::IngestOutcome;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ApiJson;
use crate::middleware::record_ingest;
use crate::routes::entities::require_entity;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUploadResponse {
    pub accepted: usize,
    pub results: Vec<IngestOutcome>,
}

/// Ingest a single sample and evaluate it against the entity's boundaries.
///
/// POST /api/v1/locations
pub async fn upload_location(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RawLocationSample>,
) -> Result<Json<IngestOutcome>, ApiError> {
    let outcome = state.pipeline.ingest(request).await?;
    record_ingest(&outcome);

    info!(
        entity_id = %outcome.location.entity_id,
        location_id = outcome.location.id,
        status = outcome.evaluation.status.as_str(),
        notifications = outcome.evaluation.notifications.len(),
        "Location ingested"
    );

    Ok(Json(outcome))
}

/// Ingest several samples for one entity, in array order.
///
/// POST /api/v1/locations/batch
pub async fn upload_batch(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BatchUploadRequest>,
) -> Result<Json<BatchUploadResponse>, ApiError> {
    request.validate()?;

    let max_batch_size = state.config.limits.max_batch_size;
    if request.locations.len() > max_batch_size {
        return Err(ApiError::Validation(format!(
            "locations: Batch must contain at most {max_batch_size} locations"
        )));
    }

    let results = state
        .pipeline
        .ingest_batch(request.entity_id, request.locations)
        .await?;
    results.iter().for_each(record_ingest);

    if let Some(first) = results.first() {
        info!(
            entity_id = %first.location.entity_id,
            count = results.len(),
            "Location batch ingested"
        );
    }

    Ok(Json(BatchUploadResponse {
        accepted: results.len(),
        results,
    }))
}

/// Recent samples for an entity, newest `observedAt` first.
///
/// GET /api/v1/entities/:entity_id/locations
pub async fn get_location_history(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
    Query(query): Query<LocationHistoryQuery>,
) -> Result<Json<LocationHistoryResponse>, ApiError> {
    let entity_id = EntityId::new(entity_id);
    require_entity(&state, &entity_id).await?;

    let limit = query
        .effective_limit()
        .min(state.config.limits.location_history_limit);
    let locations = state.catalog.recent_locations(&entity_id, limit).await?;

    Ok(Json(LocationHistoryResponse {
        total: locations.len(),
        locations,
    }))
}
