//! Storage collaborator interfaces.
//!
//! The geofence engine performs no I/O itself. [`GeofenceStore`] is what the
//! ingestion pipeline needs to record samples and carry containment state
//! between evaluations; [`TrackingCatalog`] is the read-only query and
//! registration surface used by the HTTP layer. The persistence crate
//! implements both on PostgreSQL; [`memory::InMemoryStore`] implements both
//! in process for development and tests.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Boundary, BoundaryPolygon, EntityId, EntityState, LocationRecord, LocationSample,
    Notification, NotificationEvent, TrackedEntity,
};

pub use memory::InMemoryStore;

/// Storage-layer failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operations required by the ingestion pipeline.
///
/// Implementations must tolerate unknown entities and deleted boundaries:
/// loading either yields empty results rather than an error.
#[async_trait]
pub trait GeofenceStore: Send + Sync {
    /// Returns whether the entity exists.
    async fn entity_exists(&self, entity_id: &EntityId) -> StoreResult<bool>;

    /// Loads the entity's boundaries as validated polygons.
    ///
    /// Stored boundaries whose GeoJSON cannot be parsed are logged and omitted.
    async fn load_boundaries(&self, entity_id: &EntityId) -> StoreResult<Vec<BoundaryPolygon>>;

    /// Loads the entity's containment rows. Unknown entities yield an empty state.
    async fn load_containment_state(&self, entity_id: &EntityId) -> StoreResult<EntityState>;

    /// Replaces the entity's containment rows with `state`.
    async fn save_containment_state(
        &self,
        entity_id: &EntityId,
        state: &EntityState,
    ) -> StoreResult<()>;

    /// Appends a location sample to the entity's history.
    async fn append_location(&self, sample: &LocationSample) -> StoreResult<LocationRecord>;

    /// Appends a notification.
    async fn append_notification(&self, event: &NotificationEvent) -> StoreResult<Notification>;

    /// Persists an evaluation's updated state together with its events.
    ///
    /// The default runs the two writes one after the other, which gives
    /// at-most-once event delivery if the process dies in between.
    /// Transactional backends override this to commit both atomically.
    async fn commit_evaluation(
        &self,
        entity_id: &EntityId,
        state: &EntityState,
        events: &[NotificationEvent],
    ) -> StoreResult<Vec<Notification>> {
        self.save_containment_state(entity_id, state).await?;
        let mut stored = Vec::with_capacity(events.len());
        for event in events {
            stored.push(self.append_notification(event).await?);
        }
        Ok(stored)
    }

    /// Checks that the backend is reachable.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Query and registration operations over persisted tracking data.
#[async_trait]
pub trait TrackingCatalog: Send + Sync {
    async fn create_entity(&self, entity_id: &EntityId, name: &str) -> StoreResult<TrackedEntity>;

    async fn get_entity(&self, entity_id: &EntityId) -> StoreResult<Option<TrackedEntity>>;

    /// Registers a boundary. Fails with `NotFound` if the entity does not exist.
    async fn create_boundary(
        &self,
        entity_id: &EntityId,
        name: &str,
        boundary_geojson: &serde_json::Value,
    ) -> StoreResult<Boundary>;

    async fn list_boundaries(&self, entity_id: &EntityId) -> StoreResult<Vec<Boundary>>;

    /// Deletes a boundary and its containment rows. Returns whether it existed.
    async fn delete_boundary(&self, boundary_id: Uuid) -> StoreResult<bool>;

    /// Returns the most recent samples, newest `observed_at` first.
    async fn recent_locations(
        &self,
        entity_id: &EntityId,
        limit: i64,
    ) -> StoreResult<Vec<LocationRecord>>;

    /// Returns notifications, newest first.
    async fn list_notifications(
        &self,
        entity_id: &EntityId,
        unseen_only: bool,
        limit: i64,
    ) -> StoreResult<Vec<Notification>>;

    /// Flags a notification as seen. Returns `None` if it does not exist.
    async fn mark_notification_seen(&self, notification_id: Uuid)
        -> StoreResult<Option<Notification>>;

    /// Returns the persisted containment rows of an entity.
    async fn containment_state(&self, entity_id: &EntityId) -> StoreResult<EntityState>;
}
