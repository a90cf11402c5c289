//! API route configuration.
//!
//! Every route resolves the caller's principal via
//! [`crate::api::middleware::auth::layer`]. Creation is open to anonymous callers;
//! managing an existing mapping requires a token.

use crate::api::handlers::{
    analytics_handler, create_url_handler, delete_url_handler, edit_url_handler, get_url_handler,
};
use crate::api::middleware::auth;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Versioned API routes.
///
/// # Endpoints
///
/// - `POST   /urls`                  - Create or reuse a short URL
/// - `GET    /urls/{code}`           - Fetch an owned mapping
/// - `PATCH  /urls/{code}`           - Edit an owned mapping
/// - `DELETE /urls/{code}`           - Delete an owned mapping and its analytics
/// - `GET    /urls/{code}/analytics` - Access events of an owned mapping
pub fn api_routes(state: AppState) -> Router<AppState> {
    let owner_routes = Router::new()
        .route(
            "/urls/{code}",
            get(get_url_handler)
                .patch(edit_url_handler)
                .delete(delete_url_handler),
        )
        .route("/urls/{code}/analytics", get(analytics_handler))
        .route_layer(middleware::from_fn(auth::require_user));

    Router::new()
        .route("/urls", post(create_url_handler))
        .merge(owner_routes)
        .route_layer(middleware::from_fn_with_state(state, auth::layer))
}
