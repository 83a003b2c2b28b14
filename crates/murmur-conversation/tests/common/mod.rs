//! Scripted adapters shared by the orchestrator tests.
#![allow(dead_code)]

use async_trait::async_trait;
use murmur_conversation::{
    ConversationOrchestrator, InMemorySessionStore, PipelineSettings, SessionStore,
};
use murmur_types::{AudioReference, Turn};
use murmur_voice::{
    JobStatus, LanguageModel, LlmError, SpeechToText, SttError, TextToSpeech, TranscriptionJob,
    TtsError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FALLBACK: &str = "/static/fallback.mp3";

/// Transcribes every upload to a fixed result after one poll.
pub struct FakeStt {
    pub outcome: Result<String, String>,
}

#[async_trait]
impl SpeechToText for FakeStt {
    async fn submit(&self, _audio: &[u8]) -> Result<TranscriptionJob, SttError> {
        Ok(TranscriptionJob {
            id: "job-1".to_string(),
            status: JobStatus::Queued,
            text: None,
            error: None,
        })
    }

    async fn status(&self, job_id: &str) -> Result<TranscriptionJob, SttError> {
        let (status, text, error) = match &self.outcome {
            Ok(text) => (JobStatus::Completed, Some(text.clone()), None),
            Err(e) => (JobStatus::Failed, None, Some(e.clone())),
        };
        Ok(TranscriptionJob {
            id: job_id.to_string(),
            status,
            text,
            error,
        })
    }
}

/// Replies with a fixed text, optionally after a delay, and records every
/// history it was shown.
pub struct FakeLlm {
    pub reply: Option<String>,
    pub delay: Duration,
    pub seen: Mutex<Vec<Vec<Turn>>>,
}

impl FakeLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for FakeLlm {
    async fn generate(
        &self,
        history: &[Turn],
        _system_instruction: Option<&str>,
    ) -> Result<String, LlmError> {
        self.seen.lock().unwrap().push(history.to_vec());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply
            .clone()
            .ok_or_else(|| LlmError::Upstream("generateContent returned 503".to_string()))
    }
}

/// Returns `audio://<chunk>` and fails any chunk containing `#`.
/// The first chunk is the slowest so concurrent calls finish out of order.
#[derive(Default)]
pub struct FakeTts {
    pub fail_all: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl TextToSpeech for FakeTts {
    async fn synthesize(&self, chunk: &str) -> Result<AudioReference, TtsError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        if self.fail_all || chunk.contains('#') {
            return Err(TtsError::Upstream("speech generation returned 500".to_string()));
        }
        Ok(AudioReference::new(format!("audio://{}", chunk)))
    }
}

pub struct Harness {
    pub orchestrator: ConversationOrchestrator,
    pub store: Arc<InMemorySessionStore>,
    pub llm: Arc<FakeLlm>,
    pub tts: Arc<FakeTts>,
}

pub fn harness(stt: FakeStt, llm: FakeLlm, tts: FakeTts, settings: PipelineSettings) -> Harness {
    let store = Arc::new(InMemorySessionStore::new());
    let llm = Arc::new(llm);
    let tts = Arc::new(tts);
    let orchestrator = ConversationOrchestrator::new(
        Arc::new(stt),
        llm.clone(),
        tts.clone(),
        store.clone() as Arc<dyn SessionStore>,
        settings,
    );
    Harness {
        orchestrator,
        store,
        llm,
        tts,
    }
}

pub fn settings() -> PipelineSettings {
    PipelineSettings {
        poll_interval: Duration::from_millis(1),
        max_wait: Duration::from_secs(5),
        max_chunk_chars: 40,
        tts_concurrency: 4,
        stage_timeout: Duration::from_secs(5),
        fallback_audio: AudioReference::new(FALLBACK),
        system_instruction: Some("Be brief.".to_string()),
    }
}

pub fn transcribing(text: &str) -> FakeStt {
    FakeStt {
        outcome: Ok(text.to_string()),
    }
}
