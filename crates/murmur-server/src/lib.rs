//! Murmur server library logic.

pub mod api;
pub mod api_conversation;
pub mod api_speech;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::Config;
use murmur_conversation::{ConversationOrchestrator, InMemorySessionStore};
use murmur_voice::{LlmError, LlmService, SttError, SttService, TtsError, TtsService};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Turn pipeline and session history.
    pub orchestrator: Arc<ConversationOrchestrator>,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<ConversationOrchestrator>,
        static_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            orchestrator,
            static_dir: static_dir.into(),
        }
    }
}

/// Errors raised while wiring the upstream adapters.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Stt(#[from] SttError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Tts(#[from] TtsError),
}

/// Builds the application state from configuration with the HTTP adapters.
///
/// Missing credentials are not fatal here; turns fail at the affected stage
/// and clients receive the fallback audio.
pub fn build_state(config: &Config) -> Result<AppState, StartupError> {
    let stt = SttService::new(config.stt.clone())?;
    let llm = LlmService::new(config.llm.clone())?;
    let tts = TtsService::new(config.tts.clone())?;

    let orchestrator = ConversationOrchestrator::new(
        Arc::new(stt),
        Arc::new(llm),
        Arc::new(tts),
        Arc::new(InMemorySessionStore::new()),
        config.pipeline_settings(),
    );

    Ok(AppState::new(
        Arc::new(orchestrator),
        &config.static_files.dir,
    ))
}

/// Maximum request body size (2 MiB) for JSON endpoints.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Maximum voice upload size, matching the transcription provider's limit.
const MAX_VOICE_UPLOAD_BYTES: usize = murmur_voice::MAX_STT_INPUT_BYTES;

/// Health check handler.
async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.orchestrator.store().session_count()
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let upload_routes = Router::new()
        .route(
            "/api/sessions/{sessionKey}/voice",
            post(api_conversation::voice_turn_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_VOICE_UPLOAD_BYTES));

    let router = Router::new()
        .route("/health", get(health))
        .route(
            "/api/sessions",
            post(api_conversation::create_session_handler),
        )
        .route(
            "/api/sessions/{sessionKey}/text",
            post(api_conversation::text_turn_handler),
        )
        .route(
            "/api/sessions/{sessionKey}/history",
            get(api_conversation::get_history_handler)
                .delete(api_conversation::reset_history_handler),
        )
        .route("/api/tts", post(api_speech::generate_audio_handler))
        .route("/api/voices", get(api_speech::list_voices_handler))
        .merge(upload_routes);

    let router = serve_static(router, &state.static_dir);

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}

/// Serves the static directory under `/static`, and its `index.html` at `/`.
fn serve_static(router: Router, dir: &Path) -> Router {
    if !dir.is_dir() {
        tracing::info!(
            path = %dir.display(),
            "static directory not found, skipping static file serving"
        );
        return router;
    }

    tracing::info!(path = %dir.display(), "serving static files at /static");
    let router = router.nest_service("/static", ServeDir::new(dir));

    let index = dir.join("index.html");
    if index.is_file() {
        router.route_service("/", ServeFile::new(index))
    } else {
        router
    }
}
