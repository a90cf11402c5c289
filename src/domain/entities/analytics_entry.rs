//! Analytics entry recorded when a tracked mapping is resolved.

use chrono::{DateTime, Utc};

/// A single access event for a mapping.
///
/// Entries are append-only and are removed only together with their mapping.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AnalyticsEntry {
    pub id: i64,
    pub url_id: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Input data for appending an access event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalyticsEntry {
    pub url_id: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Request metadata captured when a short code is accessed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Visitor {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

impl Visitor {
    /// Builds the entry recorded for an access to mapping `url_id`.
    pub fn into_entry(self, url_id: i64, timestamp: DateTime<Utc>) -> NewAnalyticsEntry {
        NewAnalyticsEntry {
            url_id,
            ip: self.ip,
            user_agent: self.user_agent,
            referrer: self.referrer,
            timestamp,
        }
    }
}
