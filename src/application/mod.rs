//! Application layer services implementing business logic.
//!
//! Services consume repository traits and expose the operations HTTP handlers and
//! the admin CLI call.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Mapping creation, resolution, edits and deletion
//! - [`services::auth_service::AuthService`] - API token authentication

pub mod services;
