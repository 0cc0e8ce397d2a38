//! Tracked entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::{EntityId, TrackedEntity};

/// Database row mapping for the tracked_entities table.
#[derive(Debug, Clone, FromRow)]
pub struct TrackedEntityEntity {
    pub entity_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<TrackedEntityEntity> for TrackedEntity {
    fn from(entity: TrackedEntityEntity) -> Self {
        Self {
            entity_id: EntityId::new(entity.entity_id),
            name: entity.name,
            created_at: entity.created_at,
        }
    }
}
