//! Notification event domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::EntityId;

/// The kind of transition a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Exit,
    Entry,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exit => "exit",
            Self::Entry => "entry",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exit" => Some(Self::Exit),
            "entry" => Some(Self::Entry),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification emitted by the geofence evaluator.
///
/// `boundary_id` is `None` when the notification concerns the entity's
/// boundaries as a whole (e.g. it left several boundaries at once).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub entity_id: EntityId,
    pub boundary_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
    pub seen: bool,
}

/// A persisted notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub entity_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
    pub seen: bool,
}

impl Notification {
    pub fn from_event(id: Uuid, event: NotificationEvent) -> Self {
        Self {
            id,
            entity_id: event.entity_id,
            boundary_id: event.boundary_id,
            kind: event.kind,
            message: event.message,
            triggered_at: event.triggered_at,
            seen: event.seen,
        }
    }
}

/// Query parameters for listing notifications.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unseen_only: bool,
    pub limit: Option<i64>,
}

impl ListNotificationsQuery {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 100;

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

/// Response for listing notifications.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsResponse {
    pub notifications: Vec<Notification>,
    pub total: usize,
}
