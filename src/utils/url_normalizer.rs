//! Long URL preparation before it reaches the shortener core.
//!
//! Submissions without a scheme get an `http://` prefix, then the URL is parsed
//! and brought to a canonical form so repeated submissions of the same target
//! collapse onto one mapping.

use url::Url;

/// Errors that can occur while preparing a long URL.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("URL cannot be empty")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must have a host")]
    MissingHost,
}

/// Prepends `http://` when the input carries no scheme.
///
/// ```ignore
/// assert_eq!(add_http_prefix("example.com"), "http://example.com");
/// assert_eq!(add_http_prefix("https://example.com"), "https://example.com");
/// ```
pub fn add_http_prefix(input: &str) -> String {
    if input.contains("://") || input.starts_with("javascript:") || input.starts_with("data:") {
        input.to_string()
    } else {
        format!("http://{input}")
    }
}

/// Normalizes a submitted long URL.
///
/// # Normalization Rules
///
/// 1. **Scheme**: `http://` is added when missing; only HTTP and HTTPS are allowed
/// 2. **Hostname**: Lowercased by the parser
/// 3. **Default ports**: Removed (80 for HTTP, 443 for HTTPS)
/// 4. **Path, query and fragment**: Preserved
///
/// # Errors
///
/// Returns [`UrlNormalizationError::Empty`] for blank input,
/// [`UrlNormalizationError::InvalidFormat`] for malformed URLs,
/// [`UrlNormalizationError::UnsupportedProtocol`] for non-HTTP(S) schemes and
/// [`UrlNormalizationError::MissingHost`] when no host is present.
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlNormalizationError::Empty);
    }

    let url = Url::parse(&add_http_prefix(trimmed))
        .map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlNormalizationError::UnsupportedProtocol),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlNormalizationError::MissingHost),
    }

    // `Url` already drops the scheme's default port while parsing.
    Ok(url.to_string())
}
