//! Notification repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::NotificationEntity;
use crate::metrics::QueryTimer;

/// Column values for a new notification.
#[derive(Debug, Clone)]
pub struct NotificationInput<'a> {
    pub entity_id: &'a str,
    pub boundary_id: Option<Uuid>,
    pub kind: &'a str,
    pub message: &'a str,
    pub triggered_at: DateTime<Utc>,
}

/// Repository for emitted notifications.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        input: &NotificationInput<'_>,
    ) -> Result<NotificationEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_notification");
        let mut conn = self.pool.acquire().await?;
        let result = Self::insert_with(&mut *conn, input).await;
        timer.record();
        result
    }

    /// Inserts on an open connection or transaction.
    pub async fn insert_with(
        conn: &mut PgConnection,
        input: &NotificationInput<'_>,
    ) -> Result<NotificationEntity, sqlx::Error> {
        sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (id, entity_id, boundary_id, kind, message, triggered_at, seen)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE)
            RETURNING id, entity_id, boundary_id, kind, message, triggered_at, seen
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.entity_id)
        .bind(input.boundary_id)
        .bind(input.kind)
        .bind(input.message)
        .bind(input.triggered_at)
        .fetch_one(conn)
        .await
    }

    /// Notifications of an entity, newest first.
    pub async fn find_by_entity_id(
        &self,
        entity_id: &str,
        unseen_only: bool,
        limit: i64,
    ) -> Result<Vec<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_notifications_by_entity");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT id, entity_id, boundary_id, kind, message, triggered_at, seen
            FROM notifications
            WHERE entity_id = $1 AND ($2 = FALSE OR seen = FALSE)
            ORDER BY triggered_at DESC, id
            LIMIT $3
            "#,
        )
        .bind(entity_id)
        .bind(unseen_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn mark_seen(&self, id: Uuid) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mark_notification_seen");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            UPDATE notifications SET seen = TRUE
            WHERE id = $1
            RETURNING id, entity_id, boundary_id, kind, message, triggered_at, seen
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
