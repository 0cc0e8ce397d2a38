//! Location entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::{EntityId, LocationRecord};

/// Database row mapping for the locations table.
#[derive(Debug, Clone, FromRow)]
pub struct LocationEntity {
    pub id: i64,
    pub entity_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub observed_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

impl From<LocationEntity> for LocationRecord {
    fn from(entity: LocationEntity) -> Self {
        Self {
            id: entity.id,
            entity_id: EntityId::new(entity.entity_id),
            latitude: entity.latitude,
            longitude: entity.longitude,
            observed_at: entity.observed_at,
            received_at: entity.received_at,
        }
    }
}
