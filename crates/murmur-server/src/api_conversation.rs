//! Conversation turn and session history handlers.

use crate::{api::ApiError, AppState};
use axum::{
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    Json,
};
use murmur_types::{Turn, TurnOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Request body for a typed turn.
#[derive(Debug, Deserialize)]
pub struct TextTurnRequest {
    pub text: String,
}

/// Response body for session creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    #[serde(rename = "sessionKey")]
    pub session_key: String,
}

/// Response body for history inspection.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(rename = "sessionKey")]
    pub session_key: String,
    pub turns: Vec<Turn>,
}

/// Handler for `POST /api/sessions`.
///
/// Sessions are created lazily on first use; this only mints a fresh key.
pub async fn create_session_handler() -> (StatusCode, Json<CreateSessionResponse>) {
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_key: Uuid::new_v4().to_string(),
        }),
    )
}

/// Handler for `POST /api/sessions/{sessionKey}/voice`.
///
/// Expects a multipart body whose first file field holds the recorded audio.
pub async fn voice_turn_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_key): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<TurnOutcome>, ApiError> {
    let mut audio = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
    {
        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;
        audio = Some(bytes);
        break;
    }
    let audio = audio.ok_or_else(|| ApiError::BadRequest("no audio file provided".to_string()))?;

    tracing::debug!(session_key = %session_key, bytes = audio.len(), "voice turn received");
    let outcome = state.orchestrator.voice_turn(&session_key, &audio).await?;
    Ok(Json(outcome))
}

/// Handler for `POST /api/sessions/{sessionKey}/text`.
pub async fn text_turn_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_key): Path<String>,
    Json(payload): Json<TextTurnRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let outcome = state
        .orchestrator
        .text_turn(&session_key, &payload.text)
        .await?;
    Ok(Json(outcome))
}

/// Handler for `GET /api/sessions/{sessionKey}/history`.
pub async fn get_history_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_key): Path<String>,
) -> Json<HistoryResponse> {
    let turns = state.orchestrator.history(&session_key);
    Json(HistoryResponse { session_key, turns })
}

/// Handler for `DELETE /api/sessions/{sessionKey}/history`.
pub async fn reset_history_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_key): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.orchestrator.reset(&session_key).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "session not found: {}",
            session_key
        )))
    }
}
