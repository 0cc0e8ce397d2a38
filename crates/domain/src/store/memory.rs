//! In-process storage backend.
//!
//! Used when the service runs with `storage.backend = "memory"` and by tests.
//! Individual write or read paths can be switched into failure mode to
//! exercise degraded ingestion.

use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};
use uuid::Uuid;

use super::{GeofenceStore, StoreError, StoreResult, TrackingCatalog};
use crate::models::{
    Boundary, BoundaryPolygon, EntityId, EntityState, LocationRecord, LocationSample,
    Notification, NotificationEvent, TrackedEntity,
};

#[derive(Debug, Default)]
struct Tables {
    entities: HashMap<EntityId, TrackedEntity>,
    /// Insertion order is creation order.
    boundaries: Vec<Boundary>,
    states: HashMap<EntityId, EntityState>,
    locations: Vec<LocationRecord>,
    notifications: Vec<Notification>,
}

/// Storage backend that keeps everything in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    next_location_id: AtomicI64,
    fail_location_writes: AtomicBool,
    fail_boundary_reads: AtomicBool,
    fail_commits: AtomicBool,
    boundary_reads: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `append_location` (and `entity_exists`) fail as if the backend were down.
    pub fn fail_location_writes(&self, fail: bool) {
        self.fail_location_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes `load_boundaries` fail.
    pub fn fail_boundary_reads(&self, fail: bool) {
        self.fail_boundary_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes state saves and notification writes fail.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Total number of stored location samples across all entities.
    pub fn location_count(&self) -> usize {
        self.tables().locations.len()
    }

    /// Number of `load_boundaries` calls served so far.
    pub fn boundary_read_count(&self) -> usize {
        self.boundary_reads.load(Ordering::SeqCst)
    }

    /// Total number of stored notifications across all entities.
    pub fn notification_count(&self) -> usize {
        self.tables().notifications.len()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(flag: &AtomicBool, what: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!(
                "simulated failure during {what}"
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GeofenceStore for InMemoryStore {
    async fn entity_exists(&self, entity_id: &EntityId) -> StoreResult<bool> {
        Self::check(&self.fail_location_writes, "entity lookup")?;
        Ok(self.tables().entities.contains_key(entity_id))
    }

    async fn load_boundaries(&self, entity_id: &EntityId) -> StoreResult<Vec<BoundaryPolygon>> {
        Self::check(&self.fail_boundary_reads, "boundary load")?;
        self.boundary_reads.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables();
        let polygons = tables
            .boundaries
            .iter()
            .filter(|b| &b.entity_id == entity_id)
            .filter_map(|b| match b.to_polygon() {
                Ok(polygon) => Some(polygon),
                Err(e) => {
                    tracing::warn!(
                        entity_id = %entity_id,
                        boundary_id = %b.boundary_id,
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
        Ok(self
            .tables()
            .states
            .get(entity_id)
            .cloned()
            .unwrap_or_else(|| EntityState::new(entity_id.clone())))
    }

    async fn save_containment_state(
        &self,
        entity_id: &EntityId,
        state: &EntityState,
    ) -> StoreResult<()> {
        Self::check(&self.fail_commits, "state save")?;
        let rows = state.rows().cloned();
        self.tables()
            .states
            .insert(entity_id.clone(), EntityState::from_rows(entity_id.clone(), rows));
        Ok(())
    }

    async fn append_location(&self, sample: &LocationSample) -> StoreResult<LocationRecord> {
        Self::check(&self.fail_location_writes, "location write")?;
        let id = self.next_location_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = LocationRecord::from_sample(id, sample);
        self.tables().locations.push(record.clone());
        Ok(record)
    }

    async fn append_notification(&self, event: &NotificationEvent) -> StoreResult<Notification> {
        Self::check(&self.fail_commits, "notification write")?;
        let notification = Notification::from_event(Uuid::new_v4(), event.clone());
        self.tables().notifications.push(notification.clone());
        Ok(notification)
    }

    /// Applies state and events under one lock so a failure writes nothing.
    async fn commit_evaluation(
        &self,
        entity_id: &EntityId,
        state: &EntityState,
        events: &[NotificationEvent],
    ) -> StoreResult<Vec<Notification>> {
        Self::check(&self.fail_commits, "evaluation commit")?;
        let mut tables = self.tables();
        tables.states.insert(
            entity_id.clone(),
            EntityState::from_rows(entity_id.clone(), state.rows().cloned()),
        );
        let stored: Vec<Notification> = events
            .iter()
            .map(|event| Notification::from_event(Uuid::new_v4(), event.clone()))
            .collect();
        tables.notifications.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl TrackingCatalog for InMemoryStore {
    async fn create_entity(&self, entity_id: &EntityId, name: &str) -> StoreResult<TrackedEntity> {
        let mut tables = self.tables();
        if tables.entities.contains_key(entity_id) {
            return Err(StoreError::Conflict(format!(
                "entity '{entity_id}' already exists"
            )));
        }
        let entity = TrackedEntity {
            entity_id: entity_id.clone(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        tables.entities.insert(entity_id.clone(), entity.clone());
        Ok(entity)
    }

    async fn get_entity(&self, entity_id: &EntityId) -> StoreResult<Option<TrackedEntity>> {
        Ok(self.tables().entities.get(entity_id).cloned())
    }

    async fn create_boundary(
        &self,
        entity_id: &EntityId,
        name: &str,
        boundary_geojson: &serde_json::Value,
    ) -> StoreResult<Boundary> {
        let mut tables = self.tables();
        if !tables.entities.contains_key(entity_id) {
            return Err(StoreError::NotFound(format!("entity '{entity_id}'")));
        }
        let boundary = Boundary {
            boundary_id: Uuid::new_v4(),
            entity_id: entity_id.clone(),
            name: name.to_string(),
            boundary_geojson: boundary_geojson.clone(),
            created_at: Utc::now(),
        };
        tables.boundaries.push(boundary.clone());
        Ok(boundary)
    }

    async fn list_boundaries(&self, entity_id: &EntityId) -> StoreResult<Vec<Boundary>> {
        Ok(self
            .tables()
            .boundaries
            .iter()
            .filter(|b| &b.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn delete_boundary(&self, boundary_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables();
        let Some(pos) = tables
            .boundaries
            .iter()
            .position(|b| b.boundary_id == boundary_id)
        else {
            return Ok(false);
        };
        let removed = tables.boundaries.remove(pos);
        if let Some(state) = tables.states.get_mut(&removed.entity_id) {
            state.retain_boundaries(|id| id != boundary_id);
        }
        for notification in tables
            .notifications
            .iter_mut()
            .filter(|n| n.boundary_id == Some(boundary_id))
        {
            notification.boundary_id = None;
        }
        Ok(true)
    }

    async fn recent_locations(
        &self,
        entity_id: &EntityId,
        limit: i64,
    ) -> StoreResult<Vec<LocationRecord>> {
        let mut records: Vec<LocationRecord> = self
            .tables()
            .locations
            .iter()
            .filter(|r| &r.entity_id == entity_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.observed_at.cmp(&a.observed_at).then(b.id.cmp(&a.id)));
        records.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(records)
    }

    async fn list_notifications(
        &self,
        entity_id: &EntityId,
        unseen_only: bool,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(self
            .tables()
            .notifications
            .iter()
            .rev()
            .filter(|n| &n.entity_id == entity_id)
            .filter(|n| !unseen_only || !n.seen)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_notification_seen(
        &self,
        notification_id: Uuid,
    ) -> StoreResult<Option<Notification>> {
        let mut tables = self.tables();
        Ok(tables
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .map(|n| {
                n.seen = true;
                n.clone()
            }))
    }

    async fn containment_state(&self, entity_id: &EntityId) -> StoreResult<EntityState> {
        self.load_containment_state(entity_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContainmentStatus, Coordinate, NotificationKind};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn square() -> serde_json::Value {
        json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]]})
    }

    fn sample(entity: &str, minutes_ago: i64) -> LocationSample {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        LocationSample {
            entity_id: EntityId::new(entity),
            coordinate: Coordinate::new(0.5, 0.5),
            observed_at: at,
            received_at: Utc::now(),
        }
    }

    fn exit_event(entity: &str) -> NotificationEvent {
        NotificationEvent {
            entity_id: EntityId::new(entity),
            boundary_id: None,
            kind: NotificationKind::Exit,
            message: format!("{entity} has left all designated boundary areas."),
            triggered_at: Utc::now(),
            seen: false,
        }
    }

    #[tokio::test]
    async fn test_create_entity_conflict() {
        let store = InMemoryStore::new();
        let id = EntityId::new("d1");
        store.create_entity(&id, "Rex").await.unwrap();
        assert!(store.entity_exists(&id).await.unwrap());

        let err = store.create_entity(&id, "Rex").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_boundary_requires_entity() {
        let store = InMemoryStore::new();
        let err = store
            .create_boundary(&EntityId::new("ghost"), "Yard", &square())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_load_boundaries_omits_unreadable_geojson() {
        let store = InMemoryStore::new();
        let id = EntityId::new("d1");
        store.create_entity(&id, "Rex").await.unwrap();
        store.create_boundary(&id, "Yard", &square()).await.unwrap();
        store
            .create_boundary(&id, "Broken", &json!({"type": "LineString"}))
            .await
            .unwrap();

        assert_eq!(store.list_boundaries(&id).await.unwrap().len(), 2);
        let polygons = store.load_boundaries(&id).await.unwrap();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].name, "Yard");
    }

    #[tokio::test]
    async fn test_recent_locations_newest_first() {
        let store = InMemoryStore::new();
        store.append_location(&sample("d1", 5)).await.unwrap();
        store.append_location(&sample("d1", 1)).await.unwrap();
        store.append_location(&sample("d1", 10)).await.unwrap();
        store.append_location(&sample("d2", 0)).await.unwrap();

        let records = store.recent_locations(&EntityId::new("d1"), 2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 2);
        assert_eq!(records[1].id, 1);
        assert_eq!(store.location_count(), 4);
    }

    #[tokio::test]
    async fn test_commit_and_mark_seen() {
        let store = InMemoryStore::new();
        let id = EntityId::new("d1");
        let boundary = Uuid::new_v4();
        let mut state = EntityState::new(id.clone());
        state.set(boundary, ContainmentStatus::Outside, Utc::now());

        let stored = store
            .commit_evaluation(&id, &state, &[exit_event("d1")])
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(
            store.load_containment_state(&id).await.unwrap().status_of(boundary),
            ContainmentStatus::Outside
        );

        let seen = store.mark_notification_seen(stored[0].id).await.unwrap().unwrap();
        assert!(seen.seen);
        assert!(store
            .list_notifications(&id, true, 10)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.list_notifications(&id, false, 10).await.unwrap().len(), 1);
        assert!(store
            .mark_notification_seen(Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_failed_commit_writes_nothing() {
        let store = InMemoryStore::new();
        let id = EntityId::new("d1");
        let mut state = EntityState::new(id.clone());
        state.set(Uuid::new_v4(), ContainmentStatus::Inside, Utc::now());
        store.fail_commits(true);

        let err = store
            .commit_evaluation(&id, &state, &[exit_event("d1")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.load_containment_state(&id).await.unwrap().is_empty());
        assert_eq!(store.notification_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_boundary_removes_state_rows() {
        let store = InMemoryStore::new();
        let id = EntityId::new("d1");
        store.create_entity(&id, "Rex").await.unwrap();
        let boundary = store.create_boundary(&id, "Yard", &square()).await.unwrap();
        let mut state = EntityState::new(id.clone());
        state.set(boundary.boundary_id, ContainmentStatus::Inside, Utc::now());
        store.save_containment_state(&id, &state).await.unwrap();
        let notification = store
            .append_notification(&NotificationEvent {
                boundary_id: Some(boundary.boundary_id),
                ..exit_event("d1")
            })
            .await
            .unwrap();
        assert_eq!(notification.boundary_id, Some(boundary.boundary_id));

        assert!(store.delete_boundary(boundary.boundary_id).await.unwrap());
        assert!(!store.delete_boundary(boundary.boundary_id).await.unwrap());
        assert!(store.containment_state(&id).await.unwrap().is_empty());
        assert!(store.list_boundaries(&id).await.unwrap().is_empty());

        let notifications = store.list_notifications(&id, false, 10).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].id, notification.id);
        assert_eq!(notifications[0].boundary_id, None);
    }
}
