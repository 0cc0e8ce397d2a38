//! Location repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::LocationEntity;
use crate::metrics::QueryTimer;

/// Repository for the append-only location history.
#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        entity_id: &str,
        latitude: f64,
        longitude: f64,
        observed_at: DateTime<Utc>,
        received_at: DateTime<Utc>,
    ) -> Result<LocationEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_location");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            INSERT INTO locations (entity_id, latitude, longitude, observed_at, received_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, entity_id, latitude, longitude, observed_at, received_at
            "#,
        )
        .bind(entity_id)
        .bind(latitude)
        .bind(longitude)
        .bind(observed_at)
        .bind(received_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Most recent samples, newest `observed_at` first.
    pub async fn find_recent(
        &self,
        entity_id: &str,
        limit: i64,
    ) -> Result<Vec<LocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_recent_locations");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            SELECT id, entity_id, latitude, longitude, observed_at, received_at
            FROM locations
            WHERE entity_id = $1
            ORDER BY observed_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(entity_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
