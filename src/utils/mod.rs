//! Utility functions for code generation, URL processing and database errors.
//!
//! - [`code_generator`] - Short code generation and custom code validation
//! - [`url_normalizer`] - Long URL prefixing and normalization
//! - [`db_error`] - Classification of PostgreSQL errors

pub mod code_generator;
pub mod db_error;
pub mod url_normalizer;
