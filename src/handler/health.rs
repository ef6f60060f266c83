use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// How long the storage ping may take before the service reports unhealthy.
pub const HEALTH_PING_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Serialize, Debug)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
}

/// Handler for GET /healthz and GET /health
pub async fn health_handler(State(state): State<AppState>) -> Response {
    match state.store.ping(HEALTH_PING_TIMEOUT).await {
        Ok(()) => {
            debug!("Health check passed");
            let body = HealthStatus {
                status: "healthy",
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "Database unhealthy").into_response()
        }
    }
}
