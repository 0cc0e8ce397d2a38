//! Containment state entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{ContainmentStatus, EntityContainmentState, EntityId};

/// Database row mapping for the containment_states table.
#[derive(Debug, Clone, FromRow)]
pub struct ContainmentStateEntity {
    pub entity_id: String,
    pub boundary_id: Uuid,
    pub last_status: String,
    pub last_evaluated_at: DateTime<Utc>,
}

impl From<ContainmentStateEntity> for EntityContainmentState {
    fn from(entity: ContainmentStateEntity) -> Self {
        let last_status = ContainmentStatus::parse(&entity.last_status).unwrap_or_else(|| {
            tracing::warn!(
                entity_id = %entity.entity_id,
                boundary_id = %entity.boundary_id,
                status = %entity.last_status,
                "Unrecognized containment status, treating as unknown"
            );
            ContainmentStatus::Unknown
        });
        Self {
            entity_id: EntityId::new(entity.entity_id),
            boundary_id: entity.boundary_id,
            last_status,
            last_evaluated_at: entity.last_evaluated_at,
        }
    }
}
