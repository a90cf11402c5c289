//! In-process repository implementations.
//!
//! Used by the integration tests and by local runs that do not need durable
//! storage. They enforce the same contracts as the PostgreSQL repositories,
//! including short code uniqueness.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::entities::{
    AnalyticsEntry, NewAnalyticsEntry, NewUrlMapping, RedirectKind, UrlMapping,
};
use crate::domain::repositories::{AnalyticsRepository, UrlRepository};
use crate::error::AppError;

#[derive(Default)]
struct UrlTable {
    next_id: i64,
    by_code: HashMap<String, UrlMapping>,
}

/// URL mappings keyed by short code.
#[derive(Default)]
pub struct InMemoryUrlRepository {
    table: Mutex<UrlTable>,
}

impl InMemoryUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored mappings.
    pub async fn len(&self) -> usize {
        self.table.lock().await.by_code.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Overwrites a stored mapping as-is, bypassing timestamp handling.
    pub async fn put(&self, mapping: UrlMapping) {
        let mut table = self.table.lock().await;
        table.next_id = table.next_id.max(mapping.id);
        table.by_code.insert(mapping.short_code.clone(), mapping);
    }
}

#[async_trait]
impl UrlRepository for InMemoryUrlRepository {
    async fn insert(&self, new_mapping: NewUrlMapping) -> Result<UrlMapping, AppError> {
        let mut table = self.table.lock().await;

        if table.by_code.contains_key(&new_mapping.short_code) {
            return Err(AppError::DuplicateCode {
                code: new_mapping.short_code,
            });
        }

        table.next_id += 1;
        let now = Utc::now();
        let mapping = UrlMapping {
            id: table.next_id,
            long_form: new_mapping.long_form,
            short_code: new_mapping.short_code,
            redirect_kind: new_mapping.redirect_kind,
            owner_id: new_mapping.owner_id,
            created_at: now,
            modified_at: now,
        };

        table
            .by_code
            .insert(mapping.short_code.clone(), mapping.clone());

        Ok(mapping)
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlMapping>, AppError> {
        Ok(self.table.lock().await.by_code.get(short_code).cloned())
    }

    async fn find_by_long_url(
        &self,
        long_form: &str,
        redirect_kind: RedirectKind,
        owner_id: i64,
    ) -> Result<Option<UrlMapping>, AppError> {
        let table = self.table.lock().await;

        let found = table
            .by_code
            .values()
            .filter(|m| m.long_form == long_form && m.owner_id == owner_id)
            .max_by_key(|m| (m.redirect_kind == redirect_kind, m.modified_at, m.id))
            .cloned();

        Ok(found)
    }

    async fn update(&self, mapping: &UrlMapping) -> Result<(), AppError> {
        let mut table = self.table.lock().await;

        let Some(old_code) = table
            .by_code
            .values()
            .find(|m| m.id == mapping.id)
            .map(|m| m.short_code.clone())
        else {
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "id": mapping.id }),
            ));
        };

        if old_code != mapping.short_code && table.by_code.contains_key(&mapping.short_code) {
            return Err(AppError::DuplicateCode {
                code: mapping.short_code.clone(),
            });
        }

        table.by_code.remove(&old_code);
        table
            .by_code
            .insert(mapping.short_code.clone(), mapping.clone());

        Ok(())
    }

    async fn delete_by_code(&self, short_code: &str) -> Result<bool, AppError> {
        Ok(self.table.lock().await.by_code.remove(short_code).is_some())
    }
}

#[derive(Default)]
struct AnalyticsTable {
    next_id: i64,
    entries: Vec<AnalyticsEntry>,
}

/// Append-only access events.
///
/// When linked to a URL repository, inserts for a mapping that no longer exists
/// are rejected, like the foreign key on the `analytics` table.
#[derive(Default)]
pub struct InMemoryAnalyticsRepository {
    table: Mutex<AnalyticsTable>,
    urls: Option<Arc<InMemoryUrlRepository>>,
}

impl InMemoryAnalyticsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository whose entries must reference a mapping in `urls`.
    pub fn linked_to(urls: Arc<InMemoryUrlRepository>) -> Self {
        Self {
            table: Mutex::default(),
            urls: Some(urls),
        }
    }

    /// Total number of stored entries across all mappings.
    pub async fn len(&self) -> usize {
        self.table.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryAnalyticsRepository {
    async fn insert(&self, entry: NewAnalyticsEntry) -> Result<AnalyticsEntry, AppError> {
        // Held until the entry is stored so a concurrent delete cannot slip in between.
        let url_table = match &self.urls {
            Some(urls) => Some(urls.table.lock().await),
            None => None,
        };

        if let Some(url_table) = &url_table
            && !url_table.by_code.values().any(|m| m.id == entry.url_id)
        {
            return Err(AppError::internal(
                "Analytics entry references a missing mapping",
                json!({ "url_id": entry.url_id }),
            ));
        }

        let mut table = self.table.lock().await;
        table.next_id += 1;

        let stored = AnalyticsEntry {
            id: table.next_id,
            url_id: entry.url_id,
            ip: entry.ip,
            user_agent: entry.user_agent,
            referrer: entry.referrer,
            timestamp: entry.timestamp,
        };
        table.entries.push(stored.clone());

        Ok(stored)
    }

    async fn list_by_url_id(&self, url_id: i64) -> Result<Vec<AnalyticsEntry>, AppError> {
        let table = self.table.lock().await;

        let mut entries: Vec<_> = table
            .entries
            .iter()
            .filter(|e| e.url_id == url_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        Ok(entries)
    }

    async fn delete_by_url_id(&self, url_id: i64) -> Result<u64, AppError> {
        let mut table = self.table.lock().await;
        let before = table.entries.len();
        table.entries.retain(|e| e.url_id != url_id);

        Ok((before - table.entries.len()) as u64)
    }
}
