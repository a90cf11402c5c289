//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use std::net::SocketAddr;

use crate::application::services::Resolution;
use crate::domain::entities::{RedirectKind, Visitor};
use crate::error::AppError;
use crate::state::AppState;

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Redirects a short code to its long URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Response
///
/// - **307 Temporary Redirect** or **308 Permanent Redirect**, per the mapping
/// - **404 Not Found** if the code is unknown
/// - **410 Gone** if the mapping outlived its TTL
///
/// # Analytics
///
/// Visits to user-owned mappings are queued with the client IP, `User-Agent`
/// and `Referer`. Queueing never delays or fails the redirect.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, AppError> {
    let visitor = Visitor {
        ip: Some(addr.ip().to_string()),
        user_agent: header_value(&headers, header::USER_AGENT),
        referrer: header_value(&headers, header::REFERER),
    };

    match state.link_service.resolve(&code, visitor).await? {
        Resolution::Redirect {
            long_form,
            redirect_kind: RedirectKind::Temporary,
        } => Ok(Redirect::temporary(&long_form).into_response()),
        Resolution::Redirect {
            long_form,
            redirect_kind: RedirectKind::Permanent,
        } => Ok(Redirect::permanent(&long_form).into_response()),
        Resolution::NotFound => Err(AppError::not_found(
            "Short link not found",
            json!({ "short": code }),
        )),
        Resolution::Expired { expired_at } => Err(AppError::expired(
            "Short link has expired",
            json!({ "short": code, "expired_at": expired_at }),
        )),
    }
}
