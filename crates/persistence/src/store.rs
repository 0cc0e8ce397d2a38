//! PostgreSQL implementation of the domain storage traits.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{
    Boundary, BoundaryPolygon, EntityContainmentState, EntityId, EntityState, LocationRecord,
    LocationSample, Notification, NotificationEvent, TrackedEntity,
};
use domain::store::{GeofenceStore, StoreError, StoreResult, TrackingCatalog};

use crate::metrics::{record_pool_metrics, QueryTimer};
use crate::repositories::containment_state::ContainmentRow;
use crate::repositories::notification::NotificationInput;
use crate::repositories::{
    BoundaryRepository, ContainmentStateRepository, LocationRepository, NotificationRepository,
    TrackedEntityRepository,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Maps a sqlx error onto the storage error taxonomy.
fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => StoreError::Conflict(db.message().to_string()),
            Some(FOREIGN_KEY_VIOLATION) => StoreError::NotFound(db.message().to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        },
        _ => StoreError::Unavailable(err.to_string()),
    }
}

fn containment_rows(state: &EntityState) -> Vec<ContainmentRow<'static>> {
    state
        .rows()
        .map(|row| {
            (
                row.boundary_id,
                row.last_status.as_str(),
                row.last_evaluated_at,
            )
        })
        .collect()
}

fn notification_input(event: &NotificationEvent) -> NotificationInput<'_> {
    NotificationInput {
        entity_id: event.entity_id.as_str(),
        boundary_id: event.boundary_id,
        kind: event.kind.as_str(),
        message: &event.message,
        triggered_at: event.triggered_at,
    }
}

/// Storage backed by PostgreSQL.
#[derive(Clone)]
pub struct PgGeofenceStore {
    pool: PgPool,
    entities: TrackedEntityRepository,
    boundaries: BoundaryRepository,
    locations: LocationRepository,
    containment: ContainmentStateRepository,
    notifications: NotificationRepository,
}

impl PgGeofenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            entities: TrackedEntityRepository::new(pool.clone()),
            boundaries: BoundaryRepository::new(pool.clone()),
            locations: LocationRepository::new(pool.clone()),
            containment: ContainmentStateRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl GeofenceStore for PgGeofenceStore {
    async fn entity_exists(&self, entity_id: &EntityId) -> StoreResult<bool> {
        self.entities
            .exists(entity_id.as_str())
            .await
            .map_err(store_error)
    }

    async fn load_boundaries(&self, entity_id: &EntityId) -> StoreResult<Vec<BoundaryPolygon>> {
        let rows = self
            .boundaries
            .find_by_entity_id(entity_id.as_str())
            .await
            .map_err(store_error)?;

        let polygons = rows
            .into_iter()
            .map(Boundary::from)
            .filter_map(|boundary| match boundary.to_polygon() {
                Ok(polygon) => Some(polygon),
                Err(e) => {
                    tracing::warn!(
                        entity_id = %entity_id,
                        boundary_id = %boundary.boundary_id,
                        error = %e,
                        "Omitting boundary with unreadable GeoJSON"
                    );
                    None
                }
            })
            .collect();
        Ok(polygons)
    }

    async fn load_containment_state(&self, entity_id: &EntityId) -> StoreResult<EntityState> {
        let rows = self
            .containment
            .find_by_entity_id(entity_id.as_str())
            .await
            .map_err(store_error)?;
        Ok(EntityState::from_rows(
            entity_id.clone(),
            rows.into_iter().map(EntityContainmentState::from),
        ))
    }

    async fn save_containment_state(
        &self,
        entity_id: &EntityId,
        state: &EntityState,
    ) -> StoreResult<()> {
        self.containment
            .replace_for_entity(entity_id.as_str(), &containment_rows(state))
            .await
            .map_err(store_error)
    }

    async fn append_location(&self, sample: &LocationSample) -> StoreResult<LocationRecord> {
        self.locations
            .insert(
                sample.entity_id.as_str(),
                sample.coordinate.latitude,
                sample.coordinate.longitude,
                sample.observed_at,
                sample.received_at,
            )
            .await
            .map(LocationRecord::from)
            .map_err(store_error)
    }

    async fn append_notification(&self, event: &NotificationEvent) -> StoreResult<Notification> {
        self.notifications
            .insert(&notification_input(event))
            .await
            .map(Notification::from)
            .map_err(store_error)
    }

    /// Writes the state rows and the notifications in one transaction.
    async fn commit_evaluation(
        &self,
        entity_id: &EntityId,
        state: &EntityState,
        events: &[NotificationEvent],
    ) -> StoreResult<Vec<Notification>> {
        let timer = QueryTimer::new("commit_evaluation");
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        ContainmentStateRepository::replace_rows(
            &mut *tx,
            entity_id.as_str(),
            &containment_rows(state),
        )
        .await
        .map_err(store_error)?;

        let mut stored = Vec::with_capacity(events.len());
        for event in events {
            let row = NotificationRepository::insert_with(&mut *tx, &notification_input(event))
                .await
                .map_err(store_error)?;
            stored.push(Notification::from(row));
        }

        tx.commit().await.map_err(store_error)?;
        timer.record();
        Ok(stored)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        record_pool_metrics(&self.pool);
        Ok(())
    }
}

#[async_trait]
impl TrackingCatalog for PgGeofenceStore {
    async fn create_entity(&self, entity_id: &EntityId, name: &str) -> StoreResult<TrackedEntity> {
        self.entities
            .create(entity_id.as_str(), name)
            .await
            .map(TrackedEntity::from)
            .map_err(store_error)
    }

    async fn get_entity(&self, entity_id: &EntityId) -> StoreResult<Option<TrackedEntity>> {
        self.entities
            .find_by_id(entity_id.as_str())
            .await
            .map(|row| row.map(TrackedEntity::from))
            .map_err(store_error)
    }

    async fn create_boundary(
        &self,
        entity_id: &EntityId,
        name: &str,
        boundary_geojson: &serde_json::Value,
    ) -> StoreResult<Boundary> {
        self.boundaries
            .create(entity_id.as_str(), name, boundary_geojson)
            .await
            .map(Boundary::from)
            .map_err(store_error)
    }

    async fn list_boundaries(&self, entity_id: &EntityId) -> StoreResult<Vec<Boundary>> {
        self.boundaries
            .find_by_entity_id(entity_id.as_str())
            .await
            .map(|rows| rows.into_iter().map(Boundary::from).collect())
            .map_err(store_error)
    }

    async fn delete_boundary(&self, boundary_id: Uuid) -> StoreResult<bool> {
        self.boundaries
            .delete(boundary_id)
            .await
            .map(|deleted| deleted > 0)
            .map_err(store_error)
    }

    async fn recent_locations(
        &self,
        entity_id: &EntityId,
        limit: i64,
    ) -> StoreResult<Vec<LocationRecord>> {
        self.locations
            .find_recent(entity_id.as_str(), limit)
            .await
            .map(|rows| rows.into_iter().map(LocationRecord::from).collect())
            .map_err(store_error)
    }

    async fn list_notifications(
        &self,
        entity_id: &EntityId,
        unseen_only: bool,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        self.notifications
            .find_by_entity_id(entity_id.as_str(), unseen_only, limit)
            .await
            .map(|rows| rows.into_iter().map(Notification::from).collect())
            .map_err(store_error)
    }

    async fn mark_notification_seen(
        &self,
        notification_id: Uuid,
    ) -> StoreResult<Option<Notification>> {
        self.notifications
            .mark_seen(notification_id)
            .await
            .map(|row| row.map(Notification::from))
            .map_err(store_error)
    }

    async fn containment_state(&self, entity_id: &EntityId) -> StoreResult<EntityState> {
        self.load_containment_state(entity_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::{ContainmentStatus, NotificationKind};

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn test_pool_errors_map_to_unavailable() {
        assert!(matches!(
            store_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn test_containment_rows_use_status_strings() {
        let mut state = EntityState::new(EntityId::new("d1"));
        let boundary = Uuid::new_v4();
        state.set(boundary, ContainmentStatus::Inside, Utc::now());

        let rows = containment_rows(&state);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, boundary);
        assert_eq!(rows[0].1, "inside");
    }

    #[test]
    fn test_notification_input_borrows_event() {
        let event = NotificationEvent {
            entity_id: EntityId::new("d1"),
            boundary_id: None,
            kind: NotificationKind::Exit,
            message: "d1 has left all designated boundary areas.".to_string(),
            triggered_at: Utc::now(),
            seen: false,
        };
        let input = notification_input(&event);
        assert_eq!(input.entity_id, "d1");
        assert_eq!(input.kind, "exit");
        assert_eq!(input.boundary_id, None);
    }
}
