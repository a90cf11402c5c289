//! Handlers for URL management endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::urls::{CreateUrlRequest, EditUrlRequest, UrlEnvelope, UrlResponse};
use crate::domain::entities::{Principal, UrlMapping};
use crate::error::AppError;
use crate::state::AppState;

fn envelope(state: &AppState, mapping: &UrlMapping) -> UrlEnvelope {
    let ttl = state.link_service.policy().ttl;
    UrlEnvelope {
        url: UrlResponse::from_mapping(mapping, ttl),
        short_url: state.short_url(&mapping.short_code),
    }
}

/// Creates a short URL, or returns the caller's existing one for the same target.
///
/// # Endpoint
///
/// `POST /v1/urls`
///
/// # Request Body
///
/// ```json
/// { "long": "example.com/page", "short": "myCode1", "redirect": "temporary" }
/// ```
///
/// `short` and `redirect` are optional. Anonymous callers always get a permanent
/// redirect with a generated code.
///
/// # Response
///
/// **201 Created** for a new mapping, **200 OK** when an existing one is reused:
///
/// ```json
/// {
///   "url": { "id": 1, "long": "http://example.com/page", "short": "myCode1", ... },
///   "short_url": "http://localhost:3000/myCode1"
/// }
/// ```
///
/// # Errors
///
/// - 400 for invalid input
/// - 409 if the custom code is taken
/// - 500 if no free generated code was found within the retry budget
pub async fn create_url_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<UrlEnvelope>), AppError> {
    payload.validate()?;

    let command = payload.into_command()?;
    let custom_code = command
        .short_code
        .clone()
        .filter(|code| !code.is_empty() && !principal.anonymous);

    let creation = state
        .link_service
        .create(&principal, command)
        .await
        .map_err(|e| match (e, custom_code) {
            // A custom code gets a single attempt, so running out means it is taken.
            (AppError::MaxCollision { .. }, Some(code)) => {
                AppError::conflict("Short code already exists", json!({ "short": code }))
            }
            (e, _) => e,
        })?;

    let status = if creation.is_reused() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(envelope(&state, creation.mapping()))))
}

/// Returns a mapping owned by the caller.
///
/// # Endpoint
///
/// `GET /v1/urls/{code}`
///
/// # Errors
///
/// Returns 404 if the code does not exist or belongs to another user.
pub async fn get_url_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(code): Path<String>,
) -> Result<Json<UrlEnvelope>, AppError> {
    let mapping = state.link_service.get_owned(&principal, &code).await?;
    Ok(Json(envelope(&state, &mapping)))
}

/// Edits the target, code or redirect kind of a mapping. Restarts its TTL.
///
/// # Endpoint
///
/// `PATCH /v1/urls/{code}`
///
/// # Request Body
///
/// ```json
/// { "long": "https://example.org", "short": "newCode", "redirect": "permanent" }
/// ```
///
/// All fields are optional but at least one must change something.
///
/// # Response
///
/// **202 Accepted** with the updated mapping.
///
/// # Errors
///
/// - 400 if nothing would change or input is invalid
/// - 404 if the mapping is missing or not owned
/// - 409 if the new code is taken
pub async fn edit_url_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(code): Path<String>,
    Json(payload): Json<EditUrlRequest>,
) -> Result<(StatusCode, Json<UrlEnvelope>), AppError> {
    payload.validate()?;

    let mapping = state
        .link_service
        .edit(&principal, &code, payload.into_patch()?)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(envelope(&state, &mapping))))
}

/// Deletes a mapping and its analytics.
///
/// # Endpoint
///
/// `DELETE /v1/urls/{code}`
///
/// # Response
///
/// **204 No Content**.
///
/// # Errors
///
/// Returns 404 if the mapping is missing or not owned.
pub async fn delete_url_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete(&principal, &code).await?;
    Ok(StatusCode::NO_CONTENT)
}
