//! Repository trait for access analytics.

use crate::domain::entities::{AnalyticsEntry, NewAnalyticsEntry};
use crate::error::AppError;
use async_trait::async_trait;

/// Append-only storage for access events.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAnalyticsRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::InMemoryAnalyticsRepository`] - In-process test double
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Appends an access event.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors, including a dangling `url_id`.
    async fn insert(&self, entry: NewAnalyticsEntry) -> Result<AnalyticsEntry, AppError>;

    /// Lists all events for a mapping, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_by_url_id(&self, url_id: i64) -> Result<Vec<AnalyticsEntry>, AppError>;

    /// Removes every event of a mapping and returns how many were deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete_by_url_id(&self, url_id: i64) -> Result<u64, AppError>;
}
