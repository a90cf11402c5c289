//! REST API layer for HTTP request/response handling.
//!
//! # Modules
//!
//! - [`dto`] - Request/response bodies and their validation
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Principal resolution and tracing
//! - [`routes`] - Route configuration

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
