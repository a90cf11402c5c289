//! PostgreSQL implementation of the URL record store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewUrlMapping, RedirectKind, UrlMapping};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::utils::db_error::is_unique_violation_on_code;

const SELECT_COLUMNS: &str =
    "id, long_form, short_code, redirect_kind, owner_id, created_at, modified_at";

#[derive(sqlx::FromRow)]
struct UrlRow {
    id: i64,
    long_form: String,
    short_code: String,
    redirect_kind: String,
    owner_id: i64,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl TryFrom<UrlRow> for UrlMapping {
    type Error = AppError;

    fn try_from(row: UrlRow) -> Result<Self, Self::Error> {
        let redirect_kind = row.redirect_kind.parse::<RedirectKind>().map_err(|e| {
            AppError::internal("Corrupt redirect kind", json!({ "reason": e, "id": row.id }))
        })?;

        Ok(UrlMapping {
            id: row.id,
            long_form: row.long_form,
            short_code: row.short_code,
            redirect_kind,
            owner_id: row.owner_id,
            created_at: row.created_at,
            modified_at: row.modified_at,
        })
    }
}

fn duplicate_or(e: sqlx::Error, code: &str) -> AppError {
    if is_unique_violation_on_code(&e) {
        AppError::DuplicateCode {
            code: code.to_string(),
        }
    } else {
        AppError::from(e)
    }
}

/// PostgreSQL repository for URL mappings.
///
/// Short code uniqueness is enforced by the `urls_short_code_key` constraint.
/// Violations surface as [`AppError::DuplicateCode`] so the collision resolver
/// can retry.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn insert(&self, new_mapping: NewUrlMapping) -> Result<UrlMapping, AppError> {
        let sql = format!(
            "INSERT INTO urls (long_form, short_code, redirect_kind, owner_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {SELECT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(&new_mapping.long_form)
            .bind(&new_mapping.short_code)
            .bind(new_mapping.redirect_kind.as_str())
            .bind(new_mapping.owner_id)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| duplicate_or(e, &new_mapping.short_code))?;

        row.try_into()
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlMapping>, AppError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM urls WHERE short_code = $1");

        let row = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(short_code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(UrlMapping::try_from).transpose()
    }

    async fn find_by_long_url(
        &self,
        long_form: &str,
        redirect_kind: RedirectKind,
        owner_id: i64,
    ) -> Result<Option<UrlMapping>, AppError> {
        // Prefer an exact kind match, then the most recently touched mapping.
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM urls
             WHERE long_form = $1 AND owner_id = $2
             ORDER BY (redirect_kind = $3) DESC, modified_at DESC
             LIMIT 1"
        );

        let row = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(long_form)
            .bind(owner_id)
            .bind(redirect_kind.as_str())
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(UrlMapping::try_from).transpose()
    }

    async fn update(&self, mapping: &UrlMapping) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE urls
             SET long_form = $2, short_code = $3, redirect_kind = $4, modified_at = $5
             WHERE id = $1",
        )
        .bind(mapping.id)
        .bind(&mapping.long_form)
        .bind(&mapping.short_code)
        .bind(mapping.redirect_kind.as_str())
        .bind(mapping.modified_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| duplicate_or(e, &mapping.short_code))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "id": mapping.id }),
            ));
        }

        Ok(())
    }

    async fn delete_by_code(&self, short_code: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM urls WHERE short_code = $1")
            .bind(short_code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
