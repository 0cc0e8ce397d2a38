//! Containment state repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::ContainmentStateEntity;
use crate::metrics::QueryTimer;

/// One row to write: `(boundary_id, last_status, last_evaluated_at)`.
pub type ContainmentRow<'a> = (Uuid, &'a str, DateTime<Utc>);

/// Repository for per-(entity, boundary) containment rows.
#[derive(Clone)]
pub struct ContainmentStateRepository {
    pool: PgPool,
}

impl ContainmentStateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_entity_id(
        &self,
        entity_id: &str,
    ) -> Result<Vec<ContainmentStateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_containment_states_by_entity");
        let result = sqlx::query_as::<_, ContainmentStateEntity>(
            r#"
            SELECT entity_id, boundary_id, last_status, last_evaluated_at
            FROM containment_states
            WHERE entity_id = $1
            ORDER BY boundary_id
            "#,
        )
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replaces all rows of an entity in its own transaction.
    pub async fn replace_for_entity(
        &self,
        entity_id: &str,
        rows: &[ContainmentRow<'_>],
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("replace_containment_states");
        let mut tx = self.pool.begin().await?;
        Self::replace_rows(&mut *tx, entity_id, rows).await?;
        tx.commit().await?;
        timer.record();
        Ok(())
    }

    /// Replaces all rows of an entity on an open connection or transaction.
    pub async fn replace_rows(
        conn: &mut PgConnection,
        entity_id: &str,
        rows: &[ContainmentRow<'_>],
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM containment_states WHERE entity_id = $1
            "#,
        )
        .bind(entity_id)
        .execute(&mut *conn)
        .await?;

        for &(boundary_id, status, evaluated_at) in rows {
            sqlx::query(
                r#"
                INSERT INTO containment_states (entity_id, boundary_id, last_status, last_evaluated_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(entity_id)
            .bind(boundary_id)
            .bind(status)
            .bind(evaluated_at)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}
