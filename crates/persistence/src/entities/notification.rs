//! Notification entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{EntityId, Notification, NotificationKind};

/// Database row mapping for the notifications table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub entity_id: String,
    pub boundary_id: Option<Uuid>,
    pub kind: String, // CHECK (kind IN ('exit', 'entry'))
    pub message: String,
    pub triggered_at: DateTime<Utc>,
    pub seen: bool,
}

impl From<NotificationEntity> for Notification {
    fn from(entity: NotificationEntity) -> Self {
        Self {
            id: entity.id,
            entity_id: EntityId::new(entity.entity_id),
            boundary_id: entity.boundary_id,
            kind: NotificationKind::parse(&entity.kind).unwrap_or(NotificationKind::Exit),
            message: entity.message,
            triggered_at: entity.triggered_at,
            seen: entity.seen,
        }
    }
}
