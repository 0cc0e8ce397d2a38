//! Notification reads for the delivery side.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use domain::models::notification::{ListNotificationsQuery, ListNotificationsResponse};
use domain::models::{EntityId, Notification};

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::entities::require_entity;

/// Notifications for an entity, newest first.
///
/// GET /api/v1/entities/:entity_id/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<ListNotificationsResponse>, ApiError> {
    let entity_id = EntityId::new(entity_id);
    require_entity(&state, &entity_id).await?;

    let limit = query
        .effective_limit()
        .min(state.config.limits.notification_list_limit);
    let notifications = state
        .catalog
        .list_notifications(&entity_id, query.unseen_only, limit)
        .await?;

    Ok(Json(ListNotificationsResponse {
        total: notifications.len(),
        notifications,
    }))
}

/// POST /api/v1/notifications/:notification_id/seen
pub async fn mark_seen(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = state
        .catalog
        .mark_notification_seen(notification_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Notification '{notification_id}' not found")))?;

    tracing::debug!(
        notification_id = %notification.id,
        entity_id = %notification.entity_id,
        "Notification marked seen"
    );
    Ok(Json(notification))
}
