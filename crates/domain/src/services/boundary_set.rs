//! The set of boundaries that applies to one entity.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{BoundaryPolygon, EntityId};
use crate::services::geometry::{self, GeometryError};
use crate::store::{GeofenceStore, StoreError};

/// Boundaries owned by one entity, as loaded for a single evaluation.
///
/// Boundaries owned by other entities never enter the set, and each boundary
/// id appears at most once. Every polygon is validated once on entry and the
/// outcome travels with it, so containment checks against the set stay
/// linear in the vertex count.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySet {
    entity_id: EntityId,
    boundaries: Vec<BoundaryPolygon>,
    defects: Vec<Option<GeometryError>>,
    loaded_at: DateTime<Utc>,
}

impl BoundarySet {
    pub fn new(
        entity_id: EntityId,
        boundaries: impl IntoIterator<Item = BoundaryPolygon>,
        loaded_at: DateTime<Utc>,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut owned = Vec::new();

        for boundary in boundaries {
            if boundary.owner_entity_id != entity_id {
                tracing::warn!(
                    entity_id = %entity_id,
                    boundary_id = %boundary.boundary_id,
                    owner_entity_id = %boundary.owner_entity_id,
                    "Dropping boundary owned by another entity"
                );
                continue;
            }
            if seen.insert(boundary.boundary_id) {
                owned.push(boundary);
            }
        }

        let defects = owned
            .iter()
            .map(|boundary| geometry::validate_polygon(boundary).err())
            .collect();

        Self {
            entity_id,
            boundaries: owned,
            defects,
            loaded_at,
        }
    }

    /// An empty set for an entity with no boundaries.
    pub fn empty(entity_id: EntityId) -> Self {
        Self::new(entity_id, Vec::new(), Utc::now())
    }

    /// Loads the current boundaries of an entity from storage.
    pub async fn boundaries_for(
        store: &dyn GeofenceStore,
        entity_id: &EntityId,
    ) -> Result<Self, StoreError> {
        let boundaries = store.load_boundaries(entity_id).await?;
        Ok(Self::new(entity_id.clone(), boundaries, Utc::now()))
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundaryPolygon> {
        self.boundaries.iter()
    }

    /// Pairs each boundary with the reason it is malformed, if any.
    pub fn checked(&self) -> impl Iterator<Item = (&BoundaryPolygon, Option<&GeometryError>)> {
        self.boundaries
            .iter()
            .zip(self.defects.iter().map(Option::as_ref))
    }

    pub fn ids(&self) -> HashSet<Uuid> {
        self.boundaries.iter().map(|b| b.boundary_id).collect()
    }

    pub fn get(&self, boundary_id: Uuid) -> Option<&BoundaryPolygon> {
        self.boundaries.iter().find(|b| b.boundary_id == boundary_id)
    }
}
