//! Users and the resolved request principal.

use chrono::{DateTime, Utc};

use super::url_mapping::ANONYMOUS_OWNER_ID;

/// A registered account that can own mappings.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub premium: bool,
    pub created_at: DateTime<Utc>,
}

/// Capabilities of the caller on whose behalf an operation runs.
///
/// Resolved by the authentication middleware. Creation policy branches on this
/// value instead of on separate anonymous/authenticated code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub owner_id: i64,
    pub premium: bool,
    pub anonymous: bool,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            owner_id: ANONYMOUS_OWNER_ID,
            premium: false,
            anonymous: true,
        }
    }

    pub fn user(owner_id: i64, premium: bool) -> Self {
        Self {
            owner_id,
            premium,
            anonymous: false,
        }
    }

    /// Minimum accepted length of a caller-chosen short code.
    pub fn min_custom_code_len(&self) -> usize {
        if self.premium { 4 } else { 6 }
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Principal::user(user.id, user.premium)
    }
}
