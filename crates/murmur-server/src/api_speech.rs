//! Direct speech synthesis and voice catalogue handlers.

use crate::{api::ApiError, AppState};
use axum::{extract::Extension, Json};
use murmur_conversation::split_into_chunks;
use murmur_types::VoiceInfo;
use murmur_voice::TtsError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for one-shot synthesis.
#[derive(Debug, Deserialize)]
pub struct GenerateAudioRequest {
    pub text: String,
}

/// Response body for one-shot synthesis.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateAudioResponse {
    pub audio_url: String,
}

fn map_tts_error(err: TtsError) -> ApiError {
    match err {
        TtsError::Config(msg) => ApiError::InternalServerError(msg),
        TtsError::InvalidInput(msg) => ApiError::BadRequest(msg),
        e @ (TtsError::Upstream(_) | TtsError::NoAudio | TtsError::Timeout(_)) => {
            ApiError::BadGateway(e.to_string())
        }
    }
}

/// Handler for `POST /api/tts`.
///
/// Synthesizes text that fits in a single synthesis call; no session history
/// is involved.
pub async fn generate_audio_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<GenerateAudioRequest>,
) -> Result<Json<GenerateAudioResponse>, ApiError> {
    let max_chars = state.orchestrator.settings().max_chunk_chars;
    let mut chunks = split_into_chunks(&payload.text, max_chars);
    let text = match chunks.len() {
        0 => return Err(ApiError::BadRequest("text must not be empty".to_string())),
        1 => chunks.remove(0),
        _ => {
            return Err(ApiError::BadRequest(format!(
                "text exceeds {} characters; use a conversation turn for long replies",
                max_chars
            )))
        }
    };

    let audio = state
        .orchestrator
        .tts()
        .synthesize(&text)
        .await
        .map_err(map_tts_error)?;
    Ok(Json(GenerateAudioResponse {
        audio_url: audio.into_inner(),
    }))
}

/// Handler for `GET /api/voices`.
pub async fn list_voices_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<VoiceInfo>>, ApiError> {
    let voices = state
        .orchestrator
        .tts()
        .voices()
        .await
        .map_err(map_tts_error)?;
    Ok(Json(voices))
}
