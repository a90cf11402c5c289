//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: `{"message": "OK", ...}`
/// - **503 Service Unavailable**: the analytics worker has stopped
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let queue_check = check_analytics_queue(&state);
    let healthy = queue_check.status == "ok";

    let response = HealthResponse {
        message: if healthy { "OK" } else { "Degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            analytics_queue: queue_check,
        },
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

fn check_analytics_queue(state: &AppState) -> CheckStatus {
    let recorder = state.link_service.recorder();

    if recorder.is_closed() {
        CheckStatus {
            status: "error".to_string(),
            message: Some("Analytics queue is closed".to_string()),
        }
    } else {
        CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("Free slots: {}", recorder.remaining_capacity())),
        }
    }
}
