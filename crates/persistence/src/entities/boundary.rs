//! Boundary entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{Boundary, EntityId};

/// Database row mapping for the boundaries table.
#[derive(Debug, Clone, FromRow)]
pub struct BoundaryEntity {
    pub boundary_id: Uuid,
    pub entity_id: String,
    pub name: String,
    pub boundary_geojson: serde_json::Value, // JSONB
    pub created_at: DateTime<Utc>,
}

impl From<BoundaryEntity> for Boundary {
    fn from(entity: BoundaryEntity) -> Self {
        Self {
            boundary_id: entity.boundary_id,
            entity_id: EntityId::new(entity.entity_id),
            name: entity.name,
            boundary_geojson: entity.boundary_geojson,
            created_at: entity.created_at,
        }
    }
}
