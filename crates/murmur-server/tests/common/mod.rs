//! Router fixtures backed by scripted adapters.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use murmur_conversation::{ConversationOrchestrator, InMemorySessionStore, PipelineSettings};
use murmur_server::{app, AppState};
use murmur_types::{AudioReference, Turn, VoiceInfo};
use murmur_voice::{
    JobStatus, LanguageModel, LlmError, SpeechToText, SttError, TextToSpeech, TranscriptionJob,
    TtsError,
};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const FALLBACK: &str = "/static/fallback.mp3";
pub const BOUNDARY: &str = "murmur-test-boundary";

pub struct FakeStt;

#[async_trait]
impl SpeechToText for FakeStt {
    async fn submit(&self, _audio: &[u8]) -> Result<TranscriptionJob, SttError> {
        Ok(TranscriptionJob {
            id: "job-1".to_string(),
            status: JobStatus::Processing,
            text: None,
            error: None,
        })
    }

    async fn status(&self, job_id: &str) -> Result<TranscriptionJob, SttError> {
        Ok(TranscriptionJob {
            id: job_id.to_string(),
            status: JobStatus::Completed,
            text: Some("what is the weather like".to_string()),
            error: None,
        })
    }
}

/// Echoes the latest user message, or fails when asked to.
pub struct EchoLlm {
    pub fail: bool,
}

#[async_trait]
impl LanguageModel for EchoLlm {
    async fn generate(
        &self,
        history: &[Turn],
        _system_instruction: Option<&str>,
    ) -> Result<String, LlmError> {
        if self.fail {
            return Err(LlmError::Upstream("model overloaded".to_string()));
        }
        let last = history.last().map(|turn| turn.text()).unwrap_or_default();
        Ok(format!("You said: {}", last))
    }
}

/// Numbers each synthesized chunk; fails everything when `fail` is set.
pub struct CountingTts {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl TextToSpeech for CountingTts {
    async fn synthesize(&self, _chunk: &str) -> Result<AudioReference, TtsError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TtsError::Upstream("voice unavailable".to_string()));
        }
        Ok(AudioReference::new(format!("https://audio.test/{}.mp3", n)))
    }

    async fn voices(&self) -> Result<Vec<VoiceInfo>, TtsError> {
        Ok(vec![VoiceInfo {
            voice_id: "en-UK-hazel".to_string(),
            display_name: "Hazel".to_string(),
            accent: "British".to_string(),
            gender: "Female".to_string(),
        }])
    }
}

#[derive(Default)]
pub struct Options {
    pub llm_fails: bool,
    pub tts_fails: bool,
    pub static_dir: Option<std::path::PathBuf>,
}

pub fn test_app(options: Options) -> Router {
    let settings = PipelineSettings {
        poll_interval: Duration::from_millis(5),
        max_wait: Duration::from_secs(5),
        max_chunk_chars: 40,
        tts_concurrency: 2,
        stage_timeout: Duration::from_secs(5),
        fallback_audio: AudioReference::new(FALLBACK),
        system_instruction: None,
    };
    let orchestrator = ConversationOrchestrator::new(
        Arc::new(FakeStt),
        Arc::new(EchoLlm {
            fail: options.llm_fails,
        }),
        Arc::new(CountingTts {
            fail: options.tts_fails,
            calls: AtomicUsize::new(0),
        }),
        Arc::new(InMemorySessionStore::new()),
        settings,
    );
    let static_dir = options
        .static_dir
        .unwrap_or_else(|| Path::new("/nonexistent/murmur-static").to_path_buf());
    app(AppState::new(Arc::new(orchestrator), static_dir))
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Builds a multipart request with a single field.
pub fn multipart_request(
    uri: &str,
    field: &str,
    filename: Option<&str>,
    data: &[u8],
) -> Request<Body> {
    let disposition = match filename {
        Some(name) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, name
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(disposition.as_bytes());
    body.extend_from_slice(b"Content-Type: audio/webm\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Fetches the committed history of `session_key` as JSON.
pub async fn history(app: &Router, session_key: &str) -> Value {
    let uri = format!("/api/sessions/{}/history", session_key);
    body_json(send(app, empty_request("GET", &uri)).await).await
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
