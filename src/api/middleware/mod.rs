//! HTTP middleware for request processing.
//!
//! Provides principal resolution and observability middleware.

pub mod auth;
pub mod tracing;
