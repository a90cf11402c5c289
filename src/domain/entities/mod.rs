//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`UrlMapping`] - A short code bound to a destination URL
//! - [`AnalyticsEntry`] - An access event on a tracked mapping
//! - [`User`] / [`Principal`] - Mapping owners and the resolved caller identity
//!
//! # Design Pattern
//!
//! Entities come with separate input structs for creation:
//! - `NewUrlMapping`, `NewAnalyticsEntry` - For creating new records
//! - `UrlMappingPatch` - For partial edits

pub mod analytics_entry;
pub mod url_mapping;
pub mod user;

pub use analytics_entry::{AnalyticsEntry, NewAnalyticsEntry, Visitor};
pub use url_mapping::{ANONYMOUS_OWNER_ID, NewUrlMapping, RedirectKind, UrlMapping, UrlMappingPatch};
pub use user::{Principal, User};
