//! Per-entity containment state.
//!
//! One [`EntityContainmentState`] row exists per (entity, boundary) pair. The
//! rows for one entity are grouped in an [`EntityState`], which is what the
//! evaluator reads as prior state and returns as updated state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::entity::EntityId;

/// Last known containment of an entity relative to one boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainmentStatus {
    Inside,
    Outside,
    #[default]
    Unknown,
}

impl ContainmentStatus {
    pub fn from_contained(contained: bool) -> Self {
        if contained {
            Self::Inside
        } else {
            Self::Outside
        }
    }

    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inside => "inside",
            Self::Outside => "outside",
            Self::Unknown => "unknown",
        }
    }

    /// Parses from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inside" => Some(Self::Inside),
            "outside" => Some(Self::Outside),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContainmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Containment status of one entity relative to one boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityContainmentState {
    pub entity_id: EntityId,
    pub boundary_id: Uuid,
    pub last_status: ContainmentStatus,
    pub last_evaluated_at: DateTime<Utc>,
}

/// All containment rows of one entity, keyed by boundary.
///
/// Boundaries without a row are `Unknown`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    entity_id: EntityId,
    rows: BTreeMap<Uuid, EntityContainmentState>,
}

impl EntityState {
    /// Creates an empty state (every boundary `Unknown`).
    pub fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            rows: BTreeMap::new(),
        }
    }

    /// Builds the state from stored rows, ignoring rows of other entities.
    pub fn from_rows(
        entity_id: EntityId,
        rows: impl IntoIterator<Item = EntityContainmentState>,
    ) -> Self {
        let mut state = Self::new(entity_id);
        for row in rows {
            if row.entity_id == state.entity_id {
                state.rows.insert(row.boundary_id, row);
            } else {
                tracing::warn!(
                    entity_id = %state.entity_id,
                    row_entity_id = %row.entity_id,
                    boundary_id = %row.boundary_id,
                    "Ignoring containment row owned by another entity"
                );
            }
        }
        state
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Returns the last status for a boundary, `Unknown` if never evaluated.
    pub fn status_of(&self, boundary_id: Uuid) -> ContainmentStatus {
        self.rows
            .get(&boundary_id)
            .map(|row| row.last_status)
            .unwrap_or_default()
    }

    pub fn get(&self, boundary_id: Uuid) -> Option<&EntityContainmentState> {
        self.rows.get(&boundary_id)
    }

    /// Records the status for a boundary, creating the row lazily.
    pub fn set(&mut self, boundary_id: Uuid, status: ContainmentStatus, at: DateTime<Utc>) {
        self.rows.insert(
            boundary_id,
            EntityContainmentState {
                entity_id: self.entity_id.clone(),
                boundary_id,
                last_status: status,
                last_evaluated_at: at,
            },
        );
    }

    /// Drops rows whose boundary is no longer in the active set.
    pub fn retain_boundaries<F>(&mut self, mut keep: F)
    where
        F: FnMut(Uuid) -> bool,
    {
        self.rows.retain(|id, _| keep(*id));
    }

    pub fn rows(&self) -> impl Iterator<Item = &EntityContainmentState> {
        self.rows.values()
    }

    pub fn into_rows(self) -> Vec<EntityContainmentState> {
        self.rows.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Response for the containment state query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainmentStateResponse {
    pub entity_id: EntityId,
    pub boundaries: Vec<EntityContainmentState>,
    pub inside_any: bool,
}

impl From<EntityState> for ContainmentStateResponse {
    fn from(state: EntityState) -> Self {
        let entity_id = state.entity_id.clone();
        let boundaries = state.into_rows();
        let inside_any = boundaries
            .iter()
            .any(|row| row.last_status == ContainmentStatus::Inside);
        Self {
            entity_id,
            boundaries,
            inside_any,
        }
    }
}
