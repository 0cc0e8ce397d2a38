//! Tracked entity repository.

use sqlx::PgPool;

use crate::entities::TrackedEntityEntity;
use crate::metrics::QueryTimer;

/// Repository for tracked entity registration and lookup.
#[derive(Clone)]
pub struct TrackedEntityRepository {
    pool: PgPool,
}

impl TrackedEntityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        entity_id: &str,
        name: &str,
    ) -> Result<TrackedEntityEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_tracked_entity");
        let result = sqlx::query_as::<_, TrackedEntityEntity>(
            r#"
            INSERT INTO tracked_entities (entity_id, name)
            VALUES ($1, $2)
            RETURNING entity_id, name, created_at
            "#,
        )
        .bind(entity_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(
        &self,
        entity_id: &str,
    ) -> Result<Option<TrackedEntityEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_tracked_entity_by_id");
        let result = sqlx::query_as::<_, TrackedEntityEntity>(
            r#"
            SELECT entity_id, name, created_at
            FROM tracked_entities
            WHERE entity_id = $1
            "#,
        )
        .bind(entity_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn exists(&self, entity_id: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("tracked_entity_exists");
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(SELECT 1 FROM tracked_entities WHERE entity_id = $1)
            "#,
        )
        .bind(entity_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(exists.0)
    }
}
