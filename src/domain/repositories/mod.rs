//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access and are implemented by the infrastructure
//! layer. The URL repository is the only source of truth for short-code
//! uniqueness.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence` (PostgreSQL) and
//!   `crate::infrastructure::memory` (in-process test doubles)
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`UrlRepository`] - URL mapping storage
//! - [`AnalyticsRepository`] - Access event storage
//! - [`UserRepository`] / [`TokenRepository`] - Accounts and API tokens

pub mod analytics_repository;
pub mod token_repository;
pub mod url_repository;

pub use analytics_repository::AnalyticsRepository;
pub use token_repository::{ApiToken, TokenRepository, UserRepository};
pub use url_repository::UrlRepository;

#[cfg(test)]
pub use analytics_repository::MockAnalyticsRepository;
#[cfg(test)]
pub use token_repository::{MockTokenRepository, MockUserRepository};
#[cfg(test)]
pub use url_repository::MockUrlRepository;
