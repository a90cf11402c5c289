//! Creation, resolution, editing and deletion of URL mappings.
//!
//! This is the core of the shortener:
//!
//! - **Reuse policy** collapses repeated un-aliased submissions of the same long
//!   URL by one owner onto a single mapping.
//! - **Collision resolver** ([`LinkService::create_with_retry`]) inserts with a
//!   bounded budget, regenerating the code whenever the store reports a duplicate.
//!   The store's unique constraint is the only uniqueness guard; no locks are taken.
//! - **Resolution engine** ([`LinkService::resolve`]) applies the TTL measured from
//!   `modified_at` and emits analytics for user-owned mappings.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::analytics_recorder::AnalyticsRecorder;
use crate::domain::entities::{
    AnalyticsEntry, NewUrlMapping, Principal, RedirectKind, UrlMapping, UrlMappingPatch, Visitor,
};
use crate::domain::repositories::{AnalyticsRepository, UrlRepository};
use crate::error::AppError;
use crate::utils::code_generator::{CodeGenerator, validate_custom_code};

/// Default time-to-live measured from a mapping's last modification.
pub const DEFAULT_LINK_TTL: Duration = Duration::hours(6);

/// Default number of insert attempts for generated codes.
pub const DEFAULT_MAX_INSERT_ATTEMPTS: u32 = 3;

/// Tunables of the creation and resolution policies.
#[derive(Debug, Clone, Copy)]
pub struct LinkPolicy {
    pub ttl: Duration,
    pub max_insert_attempts: u32,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_LINK_TTL,
            max_insert_attempts: DEFAULT_MAX_INSERT_ATTEMPTS,
        }
    }
}

/// A creation request after field validation.
#[derive(Debug, Clone)]
pub struct CreateLink {
    pub long_form: String,
    pub short_code: Option<String>,
    pub redirect_kind: Option<RedirectKind>,
}

/// Result of a creation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Creation {
    /// A new mapping was inserted.
    Created(UrlMapping),
    /// An existing mapping was refreshed and returned.
    Reused(UrlMapping),
}

impl Creation {
    pub fn mapping(&self) -> &UrlMapping {
        match self {
            Creation::Created(m) | Creation::Reused(m) => m,
        }
    }

    pub fn into_mapping(self) -> UrlMapping {
        match self {
            Creation::Created(m) | Creation::Reused(m) => m,
        }
    }

    pub fn is_reused(&self) -> bool {
        matches!(self, Creation::Reused(_))
    }
}

/// Outcome of resolving a short code.
///
/// Expired and missing codes are kept apart so callers can explain why a link
/// stopped working.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Redirect {
        long_form: String,
        redirect_kind: RedirectKind,
    },
    NotFound,
    Expired {
        expired_at: DateTime<Utc>,
    },
}

/// Service owning the mapping lifecycle.
pub struct LinkService {
    urls: Arc<dyn UrlRepository>,
    analytics: Arc<dyn AnalyticsRepository>,
    recorder: AnalyticsRecorder,
    generator: Arc<dyn CodeGenerator>,
    policy: LinkPolicy,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(
        urls: Arc<dyn UrlRepository>,
        analytics: Arc<dyn AnalyticsRepository>,
        recorder: AnalyticsRecorder,
        generator: Arc<dyn CodeGenerator>,
        policy: LinkPolicy,
    ) -> Self {
        Self {
            urls,
            analytics,
            recorder,
            generator,
            policy,
        }
    }

    pub fn policy(&self) -> LinkPolicy {
        self.policy
    }

    pub fn recorder(&self) -> &AnalyticsRecorder {
        &self.recorder
    }

    /// Creates a mapping for `principal`, reusing an existing one where the
    /// policy allows.
    ///
    /// # Owner classes
    ///
    /// - **Anonymous**: always permanent, never a custom code; any existing
    ///   anonymous mapping of the same long URL is reused.
    /// - **Authenticated**: without a custom code, an existing mapping of the same
    ///   long URL and kind is reused unless the caller explicitly asked for a
    ///   different kind. A custom code is never reused or regenerated.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if a custom code breaks the principal's limits
    /// - [`AppError::MaxCollision`] if a custom code is taken or every generated
    ///   candidate collided
    /// - [`AppError::Internal`] on store failures
    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateLink,
    ) -> Result<Creation, AppError> {
        let (redirect_kind, kind_requested, short_code) = if principal.anonymous {
            (RedirectKind::Permanent, false, None)
        } else {
            (
                request.redirect_kind.unwrap_or(RedirectKind::Permanent),
                request.redirect_kind.is_some(),
                request.short_code.filter(|c| !c.is_empty()),
            )
        };

        if let Some(code) = &short_code {
            validate_custom_code(code, principal)?;
        }

        if short_code.is_none()
            && let Some(existing) = self
                .find_reusable(&request.long_form, redirect_kind, kind_requested, principal)
                .await?
        {
            match self.touch(existing).await {
                Ok(refreshed) => {
                    debug!(
                        short_code = %refreshed.short_code,
                        owner_id = principal.owner_id,
                        "Reused existing mapping"
                    );
                    return Ok(Creation::Reused(refreshed));
                }
                // Deleted since the lookup; create a fresh one instead.
                Err(AppError::NotFound { .. }) => {
                    debug!(owner_id = principal.owner_id, "Reusable mapping vanished");
                }
                Err(e) => return Err(e),
            }
        }

        let mapping = self
            .create_with_retry(
                request.long_form,
                short_code,
                redirect_kind,
                principal.owner_id,
                self.policy.max_insert_attempts,
            )
            .await?;

        info!(
            short_code = %mapping.short_code,
            owner_id = mapping.owner_id,
            redirect_kind = %mapping.redirect_kind,
            "Created mapping"
        );

        Ok(Creation::Created(mapping))
    }

    /// Looks up a mapping that a creation request may reuse.
    async fn find_reusable(
        &self,
        long_form: &str,
        redirect_kind: RedirectKind,
        kind_requested: bool,
        principal: &Principal,
    ) -> Result<Option<UrlMapping>, AppError> {
        let existing = self
            .urls
            .find_by_long_url(long_form, redirect_kind, principal.owner_id)
            .await?;

        Ok(existing.filter(|m| {
            principal.anonymous || !kind_requested || m.redirect_kind == redirect_kind
        }))
    }

    /// Inserts a mapping, regenerating the code after each duplicate-code rejection.
    ///
    /// A caller-supplied `short_code` gets exactly one attempt regardless of
    /// `max_attempts`. A budget of zero is treated as one.
    ///
    /// # Errors
    ///
    /// - [`AppError::MaxCollision`] once the budget is spent; for a caller-supplied
    ///   code that is its single attempt
    /// - any other store error, immediately and without retry
    pub async fn create_with_retry(
        &self,
        long_form: String,
        short_code: Option<String>,
        redirect_kind: RedirectKind,
        owner_id: i64,
        max_attempts: u32,
    ) -> Result<UrlMapping, AppError> {
        let explicit = short_code.is_some();
        let attempts = if explicit { 1 } else { max_attempts.max(1) };
        let mut code = short_code.unwrap_or_else(|| self.generator.generate());

        for attempt in 1..=attempts {
            let new_mapping = NewUrlMapping {
                long_form: long_form.clone(),
                short_code: code.clone(),
                redirect_kind,
                owner_id,
            };

            match self.urls.insert(new_mapping).await {
                Ok(mapping) => return Ok(mapping),
                Err(AppError::DuplicateCode { .. }) => {
                    metrics::counter!("shortcode_collisions_total").increment(1);
                    warn!(attempt, attempts, short_code = %code, "Short code collision");
                    if attempt < attempts {
                        code = self.generator.generate();
                    }
                }
                Err(e) => return Err(e),
            }
        }

        metrics::counter!("shortcode_max_collisions_total").increment(1);
        Err(AppError::MaxCollision { attempts })
    }

    /// Resolves a short code at the current time.
    pub async fn resolve(&self, code: &str, visitor: Visitor) -> Result<Resolution, AppError> {
        self.resolve_at(code, visitor, Utc::now()).await
    }

    /// Resolves a short code as of `now`.
    ///
    /// A mapping is live while `now <= modified_at + ttl`. Live mappings owned by a
    /// user produce an analytics entry; anonymous ones never do. Expired mappings
    /// produce nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store failures. Analytics problems are
    /// never reported here.
    pub async fn resolve_at(
        &self,
        code: &str,
        visitor: Visitor,
        now: DateTime<Utc>,
    ) -> Result<Resolution, AppError> {
        let Some(mapping) = self.urls.find_by_code(code).await? else {
            return Ok(Resolution::NotFound);
        };

        if mapping.long_form.is_empty() {
            return Ok(Resolution::NotFound);
        }

        if mapping.is_expired_at(now, self.policy.ttl) {
            debug!(short_code = code, "Mapping expired");
            return Ok(Resolution::Expired {
                expired_at: mapping.expires_at(self.policy.ttl),
            });
        }

        if !mapping.is_anonymous() {
            self.recorder.record(visitor.into_entry(mapping.id, now));
        }

        Ok(Resolution::Redirect {
            long_form: mapping.long_form,
            redirect_kind: mapping.redirect_kind,
        })
    }

    /// Fetches a mapping owned by `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code does not exist or belongs to
    /// someone else.
    pub async fn get_owned(
        &self,
        principal: &Principal,
        code: &str,
    ) -> Result<UrlMapping, AppError> {
        let not_found = || AppError::not_found("Short link not found", json!({ "short": code }));

        if principal.anonymous {
            return Err(not_found());
        }

        let mapping = self.urls.find_by_code(code).await?.ok_or_else(not_found)?;

        if mapping.owner_id != principal.owner_id {
            return Err(not_found());
        }

        Ok(mapping)
    }

    /// Applies an edit to a mapping owned by `principal` and restarts its TTL.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the patch is empty, changes nothing or
    ///   carries an invalid short code
    /// - [`AppError::NotFound`] if the mapping is missing or not owned
    /// - [`AppError::Conflict`] if the new short code is taken
    pub async fn edit(
        &self,
        principal: &Principal,
        code: &str,
        patch: UrlMappingPatch,
    ) -> Result<UrlMapping, AppError> {
        if patch.long_form.is_none() && patch.short_code.is_none() && patch.redirect_kind.is_none()
        {
            return Err(AppError::bad_request("Need updated data", json!({})));
        }

        if let Some(new_code) = &patch.short_code {
            validate_custom_code(new_code, principal)?;
        }

        let mut mapping = self.get_owned(principal, code).await?;

        if !patch.apply_to(&mut mapping) {
            return Err(AppError::bad_request("Nothing to update", json!({})));
        }

        mapping.modified_at = Utc::now();

        match self.urls.update(&mapping).await {
            Ok(()) => {}
            Err(AppError::DuplicateCode { code }) => {
                return Err(AppError::conflict(
                    "Short code already exists",
                    json!({ "short": code }),
                ));
            }
            Err(e) => return Err(e),
        }

        info!(
            id = mapping.id,
            short_code = %mapping.short_code,
            "Edited mapping"
        );

        Ok(mapping)
    }

    /// Deletes a mapping owned by `principal` together with its analytics.
    ///
    /// Analytics cleanup failures are logged; the mapping is gone either way.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the mapping is missing or not owned.
    pub async fn delete(&self, principal: &Principal, code: &str) -> Result<(), AppError> {
        let mapping = self.get_owned(principal, code).await?;

        if !self.urls.delete_by_code(&mapping.short_code).await? {
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "short": code }),
            ));
        }

        match self.analytics.delete_by_url_id(mapping.id).await {
            Ok(removed) => debug!(url_id = mapping.id, removed, "Deleted analytics"),
            Err(e) => warn!(url_id = mapping.id, error = %e, "Failed to delete analytics"),
        }

        info!(short_code = code, "Deleted mapping");
        Ok(())
    }

    /// Returns a mapping owned by `principal` and its access events, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the mapping is missing or not owned.
    pub async fn analytics(
        &self,
        principal: &Principal,
        code: &str,
    ) -> Result<(UrlMapping, Vec<AnalyticsEntry>), AppError> {
        let mapping = self.get_owned(principal, code).await?;
        let entries = self.analytics.list_by_url_id(mapping.id).await?;
        Ok((mapping, entries))
    }

    /// Refreshes `modified_at`, restarting the mapping's TTL.
    async fn touch(&self, mut mapping: UrlMapping) -> Result<UrlMapping, AppError> {
        mapping.modified_at = Utc::now();
        self.urls.update(&mapping).await?;
        Ok(mapping)
    }
}
