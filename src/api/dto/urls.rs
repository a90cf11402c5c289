//! DTOs for the URL management endpoints.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::LazyLock;
use validator::Validate;

use crate::application::services::CreateLink;
use crate::domain::entities::{RedirectKind, UrlMapping, UrlMappingPatch};
use crate::error::AppError;
use crate::utils::url_normalizer::normalize_url;

/// Compiled regex for custom code validation. Empty input means "no custom code".
static SHORT_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]*$").unwrap());

/// Request body for `POST /v1/urls`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUrlRequest {
    /// Destination URL. `http://` is prepended when no scheme is given.
    #[validate(length(min = 1, max = 2048, message = "Long URL must be 1-2048 characters"))]
    pub long: String,

    /// Optional custom short code.
    #[serde(default)]
    #[validate(length(max = 32))]
    #[validate(regex(
        path = "*SHORT_CODE_REGEX",
        message = "Short code can only contain characters from a-z, A-Z, 0-9"
    ))]
    pub short: Option<String>,

    /// `permanent` (default) or `temporary`.
    #[serde(default)]
    pub redirect: Option<String>,
}

impl CreateUrlRequest {
    /// Normalizes the long URL and parses the redirect kind.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed URL or unknown redirect kind.
    pub fn into_command(self) -> Result<CreateLink, AppError> {
        let long_form = parse_long(&self.long)?;
        let redirect_kind = self.redirect.as_deref().map(parse_redirect).transpose()?;

        Ok(CreateLink {
            long_form,
            short_code: self.short,
            redirect_kind,
        })
    }
}

/// Request body for `PATCH /v1/urls/{code}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct EditUrlRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 2048, message = "Long URL must be 1-2048 characters"))]
    pub long: Option<String>,

    #[serde(default)]
    #[validate(length(max = 32))]
    #[validate(regex(
        path = "*SHORT_CODE_REGEX",
        message = "Short code can only contain characters from a-z, A-Z, 0-9"
    ))]
    pub short: Option<String>,

    #[serde(default)]
    pub redirect: Option<String>,
}

impl EditUrlRequest {
    /// Converts the request into a domain patch.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed URL or unknown redirect kind.
    pub fn into_patch(self) -> Result<UrlMappingPatch, AppError> {
        Ok(UrlMappingPatch {
            long_form: self.long.as_deref().map(parse_long).transpose()?,
            short_code: self.short,
            redirect_kind: self.redirect.as_deref().map(parse_redirect).transpose()?,
        })
    }
}

fn parse_long(value: &str) -> Result<String, AppError> {
    normalize_url(value).map_err(|e| AppError::bad_request(e.to_string(), json!({ "long": value })))
}

fn parse_redirect(value: &str) -> Result<RedirectKind, AppError> {
    value.parse().map_err(|_| {
        AppError::bad_request(
            "Redirect must be 'permanent' or 'temporary'",
            json!({ "redirect": value }),
        )
    })
}

/// Public view of a mapping.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UrlResponse {
    pub id: i64,
    pub long: String,
    pub short: String,
    pub redirect: RedirectKind,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl UrlResponse {
    pub fn from_mapping(mapping: &UrlMapping, ttl: Duration) -> Self {
        Self {
            id: mapping.id,
            long: mapping.long_form.clone(),
            short: mapping.short_code.clone(),
            redirect: mapping.redirect_kind,
            created_at: mapping.created_at,
            modified_at: mapping.modified_at,
            expires_at: mapping.expires_at(ttl),
        }
    }
}

/// Envelope returned by create, fetch and edit.
#[derive(Debug, Serialize, Deserialize)]
pub struct UrlEnvelope {
    pub url: UrlResponse,
    pub short_url: String,
}
