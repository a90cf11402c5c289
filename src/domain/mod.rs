//! Domain layer containing business entities and storage contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`analytics_recorder`] - Fire-and-forget access event queue and its worker
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Business logic lives in services (see [`crate::application::services`])
//!
//! # Analytics Flow
//!
//! 1. The resolution engine finds a live, user-owned mapping
//! 2. A [`entities::NewAnalyticsEntry`] is pushed to the recorder queue (non-blocking)
//! 3. [`analytics_recorder::run_analytics_worker`] persists it with retry
//! 4. Entries land in [`repositories::AnalyticsRepository`]

pub mod analytics_recorder;
pub mod entities;
pub mod repositories;
