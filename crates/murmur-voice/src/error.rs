//! Error types for the upstream capability adapters.
//!
//! Each stage has its own enum so the orchestrator has to handle every
//! failure kind of the stage it is calling.

use thiserror::Error;

/// Speech-to-text failures.
#[derive(Error, Debug)]
pub enum SttError {
    #[error("STT configuration error: {0}")]
    Config(String),

    #[error("STT invalid input: {0}")]
    InvalidInput(String),

    #[error("STT spool error: {0}")]
    Io(#[from] std::io::Error),

    #[error("STT upstream error: {0}")]
    Upstream(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("STT timed out: {0}")]
    Timeout(String),
}

/// Language-model failures.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Config(String),

    #[error("LLM upstream error: {0}")]
    Upstream(String),

    #[error("LLM returned no usable candidates")]
    NoCandidates,

    #[error("LLM timed out: {0}")]
    Timeout(String),
}

/// Text-to-speech failures.
#[derive(Error, Debug)]
pub enum TtsError {
    #[error("TTS configuration error: {0}")]
    Config(String),

    #[error("TTS invalid input: {0}")]
    InvalidInput(String),

    #[error("TTS upstream error: {0}")]
    Upstream(String),

    #[error("TTS response did not include an audio locator")]
    NoAudio,

    #[error("TTS timed out: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for SttError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SttError::Timeout(err.to_string())
        } else {
            SttError::Upstream(err.to_string())
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(err.to_string())
        } else {
            LlmError::Upstream(err.to_string())
        }
    }
}

impl From<reqwest::Error> for TtsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TtsError::Timeout(err.to_string())
        } else {
            TtsError::Upstream(err.to_string())
        }
    }
}
