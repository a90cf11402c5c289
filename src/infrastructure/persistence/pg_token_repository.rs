//! PostgreSQL implementation of the user and token repositories.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::User;
use crate::domain::repositories::{ApiToken, TokenRepository, UserRepository};
use crate::error::AppError;
use crate::utils::db_error::is_unique_violation;

const TOKEN_COLUMNS: &str = "id, user_id, name, token_hash, created_at, last_used_at, revoked_at";

/// PostgreSQL repository for user accounts.
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, name: &str, premium: bool) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, premium)
            VALUES ($1, $2)
            RETURNING id, name, premium, created_at
            "#,
        )
        .bind(name)
        .bind(premium)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("User already exists", json!({ "name": name }))
            } else {
                AppError::from(e)
            }
        })
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, User>(
            "SELECT id, name, premium, created_at FROM users ORDER BY id",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }
}

/// PostgreSQL repository for API token storage and validation.
///
/// Stores HMAC-SHA256 hashes of tokens. Raw tokens are never persisted.
pub struct PgTokenRepository {
    pool: Arc<PgPool>,
}

impl PgTokenRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn find_user_by_token(&self, token_hash: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.premium, u.created_at
            FROM api_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = $1
              AND t.revoked_at IS NULL
            "#,
        )
        .bind(token_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE api_tokens
            SET last_used_at = NOW()
            WHERE token_hash = $1
              AND revoked_at IS NULL
            "#,
        )
        .bind(token_hash)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn create_token(
        &self,
        user_id: i64,
        name: &str,
        token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        let sql = format!(
            "INSERT INTO api_tokens (user_id, name, token_hash)
             VALUES ($1, $2, $3)
             RETURNING {TOKEN_COLUMNS}"
        );

        sqlx::query_as::<_, ApiToken>(&sql)
            .bind(user_id)
            .bind(name)
            .bind(token_hash)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::conflict("Token already exists", json!({ "name": name }))
                } else {
                    AppError::from(e)
                }
            })
    }

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM api_tokens ORDER BY created_at DESC");

        let rows = sqlx::query_as::<_, ApiToken>(&sql)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ApiToken>, AppError> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM api_tokens WHERE id = $1");

        let row = sqlx::query_as::<_, ApiToken>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM api_tokens WHERE name = $1");

        let row = sqlx::query_as::<_, ApiToken>(&sql)
            .bind(name)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row)
    }

    async fn revoke_token(&self, id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE api_tokens
            SET revoked_at = NOW()
            WHERE id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}
