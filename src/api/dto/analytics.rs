//! DTOs for the analytics listing endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::urls::UrlResponse;
use crate::domain::entities::AnalyticsEntry;

/// A single access event.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsItem {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<AnalyticsEntry> for AnalyticsItem {
    fn from(entry: AnalyticsEntry) -> Self {
        Self {
            ip: entry.ip,
            user_agent: entry.user_agent,
            referrer: entry.referrer,
            timestamp: entry.timestamp,
        }
    }
}

/// Response of `GET /v1/urls/{code}/analytics`, newest events first.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub url: UrlResponse,
    pub total: usize,
    pub analytics: Vec<AnalyticsItem>,
}
