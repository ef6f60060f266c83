use crate::app::AppState;
use crate::handler::health::health_handler;
use crate::handler::ingest::{ingest_handler, method_not_allowed};
use axum::Router;
use axum::routing::{get, post};

/// Build the HTTP router (ingest + health).
pub fn router(state: AppState) -> Router {
    let ingest_router =
        Router::new().route("/ingest", post(ingest_handler).fallback(method_not_allowed));

    let health_router = Router::new()
        .route("/healthz", get(health_handler))
        .route("/health", get(health_handler));

    Router::new()
        .merge(ingest_router)
        .merge(health_router)
        .with_state(state)
}
