//! Boundary repository.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::BoundaryEntity;
use crate::metrics::QueryTimer;

/// Repository for boundary polygons.
#[derive(Clone)]
pub struct BoundaryRepository {
    pool: PgPool,
}

impl BoundaryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        entity_id: &str,
        name: &str,
        boundary_geojson: &serde_json::Value,
    ) -> Result<BoundaryEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_boundary");
        let result = sqlx::query_as::<_, BoundaryEntity>(
            r#"
            INSERT INTO boundaries (boundary_id, entity_id, name, boundary_geojson)
            VALUES ($1, $2, $3, $4)
            RETURNING boundary_id, entity_id, name, boundary_geojson, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entity_id)
        .bind(name)
        .bind(boundary_geojson)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Boundaries of an entity in creation order.
    pub async fn find_by_entity_id(
        &self,
        entity_id: &str,
    ) -> Result<Vec<BoundaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_boundaries_by_entity");
        let result = sqlx::query_as::<_, BoundaryEntity>(
            r#"
            SELECT boundary_id, entity_id, name, boundary_geojson, created_at
            FROM boundaries
            WHERE entity_id = $1
            ORDER BY created_at, boundary_id
            "#,
        )
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a boundary. Its containment rows go with it (ON DELETE CASCADE).
    /// Returns the number of rows deleted (0 or 1).
    pub async fn delete(&self, boundary_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_boundary");
        let result = sqlx::query(
            r#"
            DELETE FROM boundaries WHERE boundary_id = $1
            "#,
        )
        .bind(boundary_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
