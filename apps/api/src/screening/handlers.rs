//! Axum route handlers for the Screening API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::screening::engine::DisplayMessage;
use crate::screening::report::ExportRecord;
use crate::screening::service::SessionView;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub message: DisplayMessage,
}

fn session_not_found(session_id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {session_id} not found"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Opens a screening session and returns the greeting.
pub async fn handle_start_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<TurnResponse>) {
    let (session_id, message) = state.screening.start_session().await;
    (
        StatusCode::CREATED,
        Json(TurnResponse {
            session_id,
            message,
        }),
    )
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    state
        .screening
        .view(session_id)
        .await
        .map(Json)
        .ok_or_else(|| session_not_found(session_id))
}

/// POST /api/v1/sessions/:id/messages
///
/// One candidate turn. May wait on question or role generation.
pub async fn handle_submit_message(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SubmitMessageRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let message = state
        .screening
        .submit_turn(session_id, &request.text)
        .await
        .ok_or_else(|| session_not_found(session_id))?;

    Ok(Json(TurnResponse {
        session_id,
        message,
    }))
}

/// GET /api/v1/sessions/:id/report
///
/// The export record so far. Terminal sessions are persisted on first read
/// if the turn that ended them could not write the record.
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ExportRecord>, AppError> {
    state
        .screening
        .report(session_id)
        .await
        .map(Json)
        .ok_or_else(|| session_not_found(session_id))
}
