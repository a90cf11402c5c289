//! Repository trait for URL mapping storage.

use crate::domain::entities::{NewUrlMapping, RedirectKind, UrlMapping};
use crate::error::AppError;
use async_trait::async_trait;

/// Durable storage for URL mappings.
///
/// The store owns short-code uniqueness: concurrent inserts of the same code must
/// leave exactly one record and fail the others with [`AppError::DuplicateCode`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::InMemoryUrlRepository`] - In-process test double
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Inserts a new mapping.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicateCode`] if the short code is already taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn insert(&self, new_mapping: NewUrlMapping) -> Result<UrlMapping, AppError>;

    /// Finds a mapping by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlMapping>, AppError>;

    /// Finds a mapping of `long_form` owned by `owner_id`.
    ///
    /// A mapping with `redirect_kind` is preferred; otherwise the most recently
    /// modified mapping of any kind is returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_long_url(
        &self,
        long_form: &str,
        redirect_kind: RedirectKind,
        owner_id: i64,
    ) -> Result<Option<UrlMapping>, AppError>;

    /// Persists `long_form`, `short_code`, `redirect_kind` and `modified_at` of an
    /// existing mapping, matched by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicateCode`] if the new short code is taken.
    /// Returns [`AppError::NotFound`] if no mapping has this id.
    /// Returns [`AppError::Internal`] on database errors.
    async fn update(&self, mapping: &UrlMapping) -> Result<(), AppError>;

    /// Deletes a mapping by short code. Returns `Ok(false)` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete_by_code(&self, short_code: &str) -> Result<bool, AppError>;
}
