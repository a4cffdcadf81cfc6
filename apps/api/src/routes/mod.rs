pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Screening API
        .route("/api/v1/sessions", post(handlers::handle_start_session))
        .route("/api/v1/sessions/:id", get(handlers::handle_get_session))
        .route(
            "/api/v1/sessions/:id/messages",
            post(handlers::handle_submit_message),
        )
        .route(
            "/api/v1/sessions/:id/report",
            get(handlers::handle_get_report),
        )
        .with_state(state)
}
