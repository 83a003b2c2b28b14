//! The turn pipeline: transcribe, generate, commit, synthesize.

use crate::chunk::split_into_chunks;
use crate::error::ConversationError;
use crate::session::{SessionLocks, SessionStore};
use futures_util::stream::{self, StreamExt};
use murmur_types::{AudioReference, Turn, TurnFailure, TurnOutcome, TurnReply, TurnState};
use murmur_voice::{LanguageModel, LlmError, SpeechToText, SttError, TextToSpeech, TtsError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tunables for one orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Delay between transcription status checks.
    pub poll_interval: Duration,
    /// Upper bound on waiting for a transcript.
    pub max_wait: Duration,
    /// Longest text handed to a single synthesis call, in characters.
    pub max_chunk_chars: usize,
    /// Synthesis calls in flight per turn.
    pub tts_concurrency: usize,
    /// Upper bound on any single upstream call.
    pub stage_timeout: Duration,
    /// Played by clients whenever live audio is unavailable.
    pub fallback_audio: AudioReference,
    /// Steering instruction passed to the model.
    pub system_instruction: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_wait: Duration::from_secs(60),
            max_chunk_chars: 3000,
            tts_concurrency: 4,
            stage_timeout: Duration::from_secs(45),
            fallback_audio: AudioReference::new("/static/fallback.mp3"),
            system_instruction: None,
        }
    }
}

/// Drives voice and text turns through the upstream adapters and owns the
/// fallback policy.
///
/// History for a session is committed only after the model has replied, and
/// always as a user/model pair. Turns on the same session are serialized;
/// turns on different sessions run independently.
pub struct ConversationOrchestrator {
    stt: Arc<dyn SpeechToText>,
    llm: Arc<dyn LanguageModel>,
    tts: Arc<dyn TextToSpeech>,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    settings: PipelineSettings,
}

impl fmt::Debug for ConversationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationOrchestrator")
            .field("sessions", &self.store.session_count())
            .field("settings", &self.settings)
            .finish()
    }
}

impl ConversationOrchestrator {
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        llm: Arc<dyn LanguageModel>,
        tts: Arc<dyn TextToSpeech>,
        store: Arc<dyn SessionStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            stt,
            llm,
            tts,
            store,
            locks: SessionLocks::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn tts(&self) -> &Arc<dyn TextToSpeech> {
        &self.tts
    }

    pub fn locks(&self) -> &SessionLocks {
        &self.locks
    }

    /// Committed history of a session.
    pub fn history(&self, session_key: &str) -> Vec<Turn> {
        self.store.load(session_key)
    }

    /// Drops a session's history, waiting for any turn in progress on it.
    pub async fn reset(&self, session_key: &str) -> bool {
        let _guard = self.locks.acquire(session_key).await;
        let removed = self.store.remove(session_key);
        info!(session_key, removed, "session history reset");
        removed
    }

    /// Runs a turn from recorded speech.
    pub async fn voice_turn(
        &self,
        session_key: &str,
        audio: &[u8],
    ) -> Result<TurnOutcome, ConversationError> {
        validate_session_key(session_key)?;
        if audio.is_empty() {
            return Err(ConversationError::InvalidInput(
                "audio must not be empty".to_string(),
            ));
        }
        enter(session_key, TurnState::Received);

        enter(session_key, TurnState::Transcribing);
        let transcript = match self.transcribe(audio).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                return Ok(self.fail(
                    session_key,
                    TurnState::Transcribing,
                    "no speech was recognized",
                    None,
                    None,
                ))
            }
            Err(e) => {
                return Ok(self.fail(session_key, TurnState::Transcribing, e, None, None));
            }
        };
        debug!(session_key, chars = transcript.chars().count(), "transcript received");

        Ok(self.run_turn(session_key, transcript, true).await)
    }

    /// Runs a turn from typed text.
    pub async fn text_turn(
        &self,
        session_key: &str,
        text: &str,
    ) -> Result<TurnOutcome, ConversationError> {
        validate_session_key(session_key)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ConversationError::InvalidInput(
                "text must not be empty".to_string(),
            ));
        }
        enter(session_key, TurnState::Received);
        Ok(self.run_turn(session_key, text.to_string(), false).await)
    }

    async fn transcribe(&self, audio: &[u8]) -> Result<String, SttError> {
        let job = bounded(self.settings.stage_timeout, self.stt.submit(audio), |msg| {
            SttError::Timeout(msg)
        })
        .await?;
        self.stt
            .poll_until_done(job, self.settings.poll_interval, self.settings.max_wait)
            .await
    }

    /// Shared tail of both entry points, starting from the user's text.
    async fn run_turn(&self, session_key: &str, user_text: String, voice: bool) -> TurnOutcome {
        let transcript = voice.then(|| user_text.clone());

        let reply = {
            let _guard = self.locks.acquire(session_key).await;

            let mut working = self.store.load(session_key);
            working.push(Turn::user(user_text));
            enter(session_key, TurnState::HistoryAppended);

            enter(session_key, TurnState::Generating);
            let generated = bounded(
                self.settings.stage_timeout,
                self.llm
                    .generate(&working, self.settings.system_instruction.as_deref()),
                LlmError::Timeout,
            )
            .await;

            let reply = match generated {
                Ok(reply) if !reply.trim().is_empty() => reply,
                Ok(_) => {
                    return self.fail(
                        session_key,
                        TurnState::Generating,
                        LlmError::NoCandidates,
                        transcript,
                        None,
                    );
                }
                Err(e) => {
                    return self.fail(session_key, TurnState::Generating, e, transcript, None);
                }
            };

            working.push(Turn::model(reply.clone()));
            self.store.commit(session_key, working);
            enter(session_key, TurnState::HistoryUpdated);
            reply
        };

        enter(session_key, TurnState::Synthesizing);
        let chunks = split_into_chunks(&reply, self.settings.max_chunk_chars);

        let results = self.synthesize_chunks(&chunks).await;
        let total = results.len();
        let mut audio_references = Vec::with_capacity(total);
        let mut skipped_chunks = Vec::new();
        let mut last_error = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(audio) => audio_references.push(audio),
                Err(e) => {
                    warn!(session_key, chunk_index = index, "chunk synthesis failed: {}", e);
                    skipped_chunks.push(index);
                    last_error = Some(e);
                }
            }
        }

        if audio_references.is_empty() {
            let detail = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no audio produced".to_string());
            return self.fail(
                session_key,
                TurnState::Synthesizing,
                format!("speech synthesis failed for every chunk: {}", detail),
                transcript,
                Some(reply),
            );
        }

        let warning = (!skipped_chunks.is_empty()).then(|| {
            format!(
                "{} of {} reply chunks could not be synthesized",
                skipped_chunks.len(),
                total
            )
        });

        enter(session_key, TurnState::Completed);
        info!(
            session_key,
            chunks = total,
            skipped = skipped_chunks.len(),
            "turn completed"
        );
        TurnOutcome::Completed(TurnReply {
            audio_references,
            transcript,
            reply_text: reply,
            warning,
            skipped_chunks,
        })
    }

    /// Synthesizes every chunk, returning results in chunk order.
    async fn synthesize_chunks(&self, chunks: &[String]) -> Vec<Result<AudioReference, TtsError>> {
        let timeout = self.settings.stage_timeout;
        stream::iter(chunks.iter())
            .map(|chunk| bounded(timeout, self.tts.synthesize(chunk), TtsError::Timeout))
            .buffered(self.settings.tts_concurrency.max(1))
            .boxed()
            .collect()
            .await
    }

    fn fail(
        &self,
        session_key: &str,
        stage: TurnState,
        error: impl fmt::Display,
        transcript: Option<String>,
        reply_text: Option<String>,
    ) -> TurnOutcome {
        let error = error.to_string();
        warn!(session_key, stage = %stage, "turn failed: {}", error);
        enter(session_key, TurnState::Errored);
        TurnOutcome::Failed(TurnFailure {
            stage,
            error,
            fallback_audio_reference: self.settings.fallback_audio.clone(),
            transcript,
            reply_text,
        })
    }
}

fn validate_session_key(session_key: &str) -> Result<(), ConversationError> {
    if session_key.trim().is_empty() {
        return Err(ConversationError::InvalidInput(
            "session key must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn enter(session_key: &str, state: TurnState) {
    debug!(session_key, state = %state, "turn state");
}

/// Bounds `fut` by `limit`, mapping expiry to the stage's timeout error.
async fn bounded<T, E, F>(
    limit: Duration,
    fut: F,
    on_timeout: impl FnOnce(String) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(format!(
            "no response within {} ms",
            limit.as_millis()
        ))),
    }
}
