//! Short code generation and validation utilities.
//!
//! Generated codes are fixed-length strings over `[A-Za-z0-9]`. With the default
//! length of 6 there are 62^6 (about 5.7e10) candidates, which keeps the expected
//! number of regenerations per insert negligible for realistic table sizes.

use crate::domain::entities::Principal;
use crate::error::AppError;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::json;

/// Default length of generated codes.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Longest code, generated or custom, that the store accepts.
pub const MAX_CODE_LENGTH: usize = 32;

/// Codes that would shadow service routes.
const RESERVED_CODES: &[&str] = &["health"];

/// Source of short code candidates.
///
/// The collision resolver asks for a fresh candidate after every duplicate-code
/// rejection from the store.
#[cfg_attr(test, mockall::automock)]
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random alphanumeric code generator backed by the thread-local RNG.
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

/// Validates a caller-chosen short code against the principal's limits.
///
/// # Rules
///
/// - Length: 4 characters for premium users, 6 otherwise; at most 32
/// - Allowed characters: ASCII letters and digits
/// - Cannot be a reserved route name
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_code(code: &str, principal: &Principal) -> Result<(), AppError> {
    let min = principal.min_custom_code_len();

    if code.len() < min || code.len() > MAX_CODE_LENGTH {
        return Err(AppError::bad_request(
            format!("Custom code must be {min}-{MAX_CODE_LENGTH} characters"),
            json!({ "provided_length": code.len() }),
        ));
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::bad_request(
            "Custom code can only contain characters from a-z, A-Z, 0-9",
            json!({ "short": code }),
        ));
    }

    if RESERVED_CODES.contains(&code) {
        return Err(AppError::bad_request(
            "This code is reserved",
            json!({ "short": code }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_code_has_configured_length() {
        assert_eq!(RandomCodeGenerator::default().generate().len(), 6);
        assert_eq!(RandomCodeGenerator::new(10).generate().len(), 10);
    }

    #[test]
    fn test_generate_code_is_alphanumeric() {
        let code = RandomCodeGenerator::new(32).generate();
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_code_produces_unique_codes() {
        let generator = RandomCodeGenerator::new(12);
        let codes: HashSet<String> = (0..1000).map(|_| generator.generate()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_validate_premium_minimum() {
        let premium = Principal::user(1, true);
        assert!(validate_custom_code("abcd", &premium).is_ok());
        assert!(validate_custom_code("abc", &premium).is_err());
    }

    #[test]
    fn test_validate_regular_minimum() {
        let regular = Principal::user(1, false);
        assert!(validate_custom_code("abcd", &regular).is_err());
        assert!(validate_custom_code("abcdef", &regular).is_ok());

        let err = validate_custom_code("abcd", &regular).unwrap_err();
        assert!(err.to_string().contains("6-32 characters"));
    }

    #[test]
    fn test_validate_mixed_case_and_digits() {
        let p = Principal::user(1, false);
        assert!(validate_custom_code("MyLink2024", &p).is_ok());
    }

    #[test]
    fn test_validate_rejects_symbols() {
        let p = Principal::user(1, false);
        assert!(validate_custom_code("my-link-1", &p).is_err());
        assert!(validate_custom_code("my_link_1", &p).is_err());
        assert!(validate_custom_code("my link 1", &p).is_err());
    }

    #[test]
    fn test_validate_too_long() {
        let p = Principal::user(1, true);
        assert!(validate_custom_code(&"a".repeat(33), &p).is_err());
        assert!(validate_custom_code(&"a".repeat(32), &p).is_ok());
    }

    #[test]
    fn test_validate_reserved() {
        let p = Principal::user(1, false);
        for &reserved in RESERVED_CODES {
            assert!(validate_custom_code(reserved, &p).is_err());
        }
    }
}
