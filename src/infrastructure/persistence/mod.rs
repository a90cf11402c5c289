//! PostgreSQL repository implementations.
//!
//! Queries are plain SQLx statements mapped through `FromRow`; the schema lives in
//! `migrations/` and is applied at startup.
//!
//! # Repositories
//!
//! - [`PgUrlRepository`] - URL mappings, short code uniqueness
//! - [`PgAnalyticsRepository`] - Access events
//! - [`PgUserRepository`] / [`PgTokenRepository`] - Accounts and API tokens

pub mod pg_analytics_repository;
pub mod pg_token_repository;
pub mod pg_url_repository;

pub use pg_analytics_repository::PgAnalyticsRepository;
pub use pg_token_repository::{PgTokenRepository, PgUserRepository};
pub use pg_url_repository::PgUrlRepository;
