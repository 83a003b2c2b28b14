//! Upstream capability adapters for the Murmur relay.
//!
//! Wraps the three external services a conversation turn depends on:
//! speech-to-text (submit, then poll until the transcript is ready),
//! language-model generation over the accumulated history, and per-chunk
//! text-to-speech that yields a playable audio locator.
//!
//! Each capability is a trait so the orchestrator can be driven by test
//! doubles; `SttService`, `LlmService` and `TtsService` are the HTTP
//! implementations. Adapters surface failures through per-stage error
//! enums and never decide retry or fallback policy themselves.

pub mod config;
pub mod error;
mod http;
pub mod llm;
pub mod stt;
pub mod tts;

pub use config::{LlmConfig, SttConfig, TtsConfig};
pub use error::{LlmError, SttError, TtsError};
pub use llm::{LanguageModel, LlmService};
pub use stt::{
    AudioSpool, JobStatus, SpeechToText, SttService, TranscriptionJob, MAX_STT_INPUT_BYTES,
};
pub use tts::{TextToSpeech, TtsService};
