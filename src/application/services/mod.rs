//! Business logic services for the application layer.

pub mod auth_service;
pub mod link_service;

pub use auth_service::{AuthService, hash_token};
pub use link_service::{CreateLink, Creation, LinkPolicy, LinkService, Resolution};
