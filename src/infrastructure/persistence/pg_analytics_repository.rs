//! PostgreSQL implementation of the analytics repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{AnalyticsEntry, NewAnalyticsEntry};
use crate::domain::repositories::AnalyticsRepository;
use crate::error::AppError;

/// PostgreSQL repository for access events.
///
/// Written to by the analytics worker only; the resolution path never waits on it.
pub struct PgAnalyticsRepository {
    pool: Arc<PgPool>,
}

impl PgAnalyticsRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for PgAnalyticsRepository {
    async fn insert(&self, entry: NewAnalyticsEntry) -> Result<AnalyticsEntry, AppError> {
        let row = sqlx::query_as::<_, AnalyticsEntry>(
            r#"
            INSERT INTO analytics (url_id, ip, user_agent, referrer, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, url_id, ip, user_agent, referrer, timestamp
            "#,
        )
        .bind(entry.url_id)
        .bind(entry.ip)
        .bind(entry.user_agent)
        .bind(entry.referrer)
        .bind(entry.timestamp)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn list_by_url_id(&self, url_id: i64) -> Result<Vec<AnalyticsEntry>, AppError> {
        let rows = sqlx::query_as::<_, AnalyticsEntry>(
            r#"
            SELECT id, url_id, ip, user_agent, referrer, timestamp
            FROM analytics
            WHERE url_id = $1
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(url_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn delete_by_url_id(&self, url_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM analytics WHERE url_id = $1")
            .bind(url_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }
}
