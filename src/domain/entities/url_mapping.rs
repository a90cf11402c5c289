//! URL mapping entity: a short code bound to a destination URL.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Owner id carried by mappings created without an authenticated principal.
pub const ANONYMOUS_OWNER_ID: i64 = 0;

/// HTTP redirect semantics used when a mapping is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectKind {
    /// 307 Temporary Redirect.
    Temporary,
    /// 308 Permanent Redirect.
    Permanent,
}

impl RedirectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectKind::Temporary => "temporary",
            RedirectKind::Permanent => "permanent",
        }
    }
}

impl fmt::Display for RedirectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedirectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temporary" => Ok(RedirectKind::Temporary),
            "permanent" => Ok(RedirectKind::Permanent),
            other => Err(format!("unknown redirect kind: {other}")),
        }
    }
}

/// A stored mapping between a short code and a long URL.
///
/// `modified_at` is refreshed by every mutation, including dedup reuse, and is the
/// reference point for expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlMapping {
    pub id: i64,
    pub long_form: String,
    pub short_code: String,
    pub redirect_kind: RedirectKind,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl UrlMapping {
    /// Instant after which the mapping no longer resolves.
    ///
    /// Saturates at the latest representable instant.
    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        self.modified_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns true once `now` is strictly past `modified_at + ttl`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now > self.expires_at(ttl)
    }

    pub fn is_anonymous(&self) -> bool {
        self.owner_id == ANONYMOUS_OWNER_ID
    }
}

/// Input data for inserting a new mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUrlMapping {
    pub long_form: String,
    pub short_code: String,
    pub redirect_kind: RedirectKind,
    pub owner_id: i64,
}

/// Partial edit of an existing mapping. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UrlMappingPatch {
    pub long_form: Option<String>,
    pub short_code: Option<String>,
    pub redirect_kind: Option<RedirectKind>,
}

impl UrlMappingPatch {
    /// Applies the patch, returning true if any field actually changed.
    pub fn apply_to(self, mapping: &mut UrlMapping) -> bool {
        let mut changed = false;

        if let Some(long_form) = self.long_form
            && long_form != mapping.long_form
        {
            mapping.long_form = long_form;
            changed = true;
        }
        if let Some(short_code) = self.short_code
            && short_code != mapping.short_code
        {
            mapping.short_code = short_code;
            changed = true;
        }
        if let Some(kind) = self.redirect_kind
            && kind != mapping.redirect_kind
        {
            mapping.redirect_kind = kind;
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(modified_at: DateTime<Utc>) -> UrlMapping {
        UrlMapping {
            id: 1,
            long_form: "https://example.com".to_string(),
            short_code: "aB3xQ9".to_string(),
            redirect_kind: RedirectKind::Permanent,
            owner_id: 42,
            created_at: modified_at,
            modified_at,
        }
    }

    #[test]
    fn test_redirect_kind_round_trips_through_str() {
        assert_eq!("temporary".parse::<RedirectKind>(), Ok(RedirectKind::Temporary));
        assert_eq!("permanent".parse::<RedirectKind>(), Ok(RedirectKind::Permanent));
        assert!("sometimes".parse::<RedirectKind>().is_err());
        assert_eq!(RedirectKind::Permanent.to_string(), "permanent");
    }

    #[test]
    fn test_expiry_boundary() {
        let ttl = Duration::hours(6);
        let modified = Utc::now();
        let m = mapping(modified);

        assert!(!m.is_expired_at(modified + ttl, ttl));
        assert!(m.is_expired_at(modified + ttl + Duration::microseconds(1), ttl));
    }

    #[test]
    fn test_expiry_saturates_on_huge_ttl() {
        let m = mapping(Utc::now());
        let ttl = Duration::MAX;

        assert_eq!(m.expires_at(ttl), DateTime::<Utc>::MAX_UTC);
        assert!(!m.is_expired_at(Utc::now(), ttl));
    }

    #[test]
    fn test_is_anonymous() {
        let mut m = mapping(Utc::now());
        assert!(!m.is_anonymous());
        m.owner_id = ANONYMOUS_OWNER_ID;
        assert!(m.is_anonymous());
    }

    #[test]
    fn test_patch_reports_no_change_for_identical_values() {
        let mut m = mapping(Utc::now());
        let patch = UrlMappingPatch {
            long_form: Some("https://example.com".to_string()),
            short_code: None,
            redirect_kind: Some(RedirectKind::Permanent),
        };
        assert!(!patch.apply_to(&mut m));
    }

    #[test]
    fn test_patch_applies_changes() {
        let mut m = mapping(Utc::now());
        let patch = UrlMappingPatch {
            long_form: None,
            short_code: Some("newcode".to_string()),
            redirect_kind: Some(RedirectKind::Temporary),
        };
        assert!(patch.apply_to(&mut m));
        assert_eq!(m.short_code, "newcode");
        assert_eq!(m.redirect_kind, RedirectKind::Temporary);
        assert_eq!(m.long_form, "https://example.com");
    }
}
