//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::domain::entities::Principal;
use crate::{error::AppError, state::AppState};

/// Resolves the caller's [`Principal`] and stores it in request extensions.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Resolution
///
/// - No `Authorization` header: anonymous principal
/// - Valid, unrevoked token: principal of the token's user
///
/// # Errors
///
/// Returns `401 Unauthorized` if the header is malformed or the token is unknown
/// or revoked. Adds `WWW-Authenticate: Bearer` per RFC 6750.
///
/// # Example
///
/// ```rust,ignore
/// let api = Router::new()
///     .route("/urls", post(create_url_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let principal = if parts.headers.contains_key(header::AUTHORIZATION) {
        let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
            .await
            .map_err(|_| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({"reason": "Authorization header is invalid"}),
                )
            })?;

        st.auth_service.authenticate(&token).await?
    } else {
        Principal::anonymous()
    };

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Rejects anonymous callers. Must run after [`layer`].
///
/// # Errors
///
/// Returns `401 Unauthorized` if the principal is anonymous or missing.
pub async fn require_user(req: Request, next: Next) -> Result<Response, AppError> {
    let authenticated = req
        .extensions()
        .get::<Principal>()
        .is_some_and(|p| !p.anonymous);

    if !authenticated {
        return Err(AppError::unauthorized(
            "Unauthorized",
            json!({"reason": "Authorization header is missing"}),
        ));
    }

    Ok(next.run(req).await)
}
