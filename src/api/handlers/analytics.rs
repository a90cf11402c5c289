//! Handler for per-mapping analytics.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::api::dto::analytics::{AnalyticsItem, AnalyticsResponse};
use crate::api::dto::urls::UrlResponse;
use crate::domain::entities::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Lists access events recorded for a mapping owned by the caller.
///
/// # Endpoint
///
/// `GET /v1/urls/{code}/analytics`
///
/// # Response
///
/// ```json
/// {
///   "url": { "id": 1, "short": "aB3xQ9", ... },
///   "total": 1,
///   "analytics": [
///     { "ip": "203.0.113.7", "user_agent": "curl/8.5.0", "referrer": null, "timestamp": "..." }
///   ]
/// }
/// ```
///
/// Events are ordered newest first. Recording is asynchronous, so a redirect may
/// take a moment to show up here.
///
/// # Errors
///
/// Returns 404 if the mapping is missing or not owned.
pub async fn analytics_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(code): Path<String>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let (mapping, entries) = state.link_service.analytics(&principal, &code).await?;

    let analytics: Vec<AnalyticsItem> = entries.into_iter().map(AnalyticsItem::from).collect();

    Ok(Json(AnalyticsResponse {
        url: UrlResponse::from_mapping(&mapping, state.link_service.policy().ttl),
        total: analytics.len(),
        analytics,
    }))
}
