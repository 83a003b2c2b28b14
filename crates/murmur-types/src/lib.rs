//! Shared types for the Murmur conversational relay.
//!
//! This crate holds the data model threaded through every stage of a
//! conversation turn: role-tagged history entries, audio locators, the
//! pipeline state labels and the structured outcome returned to clients.
//! It performs no I/O so that adapters, the orchestrator and the transport
//! layer can all depend on it without pulling in each other.

pub mod voice;

pub use voice::{AudioFormat, VoiceInfo, VoiceProfile};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation.
    User,
    /// The language model.
    Model,
}

impl Role {
    /// Returns the string label for this role, as used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role-tagged message in a session's history.
///
/// Fields are private: a turn is never modified after it has been created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Opaque locator (usually a URL) of a playable audio clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioReference(String);

impl AudioReference {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AudioReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stages of a conversation turn.
///
/// `Errored` is absorbing; a failure records the stage that was running
/// when it happened instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Received,
    Transcribing,
    HistoryAppended,
    Generating,
    HistoryUpdated,
    Synthesizing,
    Completed,
    Errored,
}

impl TurnState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Transcribing => "transcribing",
            Self::HistoryAppended => "history_appended",
            Self::Generating => "generating",
            Self::HistoryUpdated => "history_updated",
            Self::Synthesizing => "synthesizing",
            Self::Completed => "completed",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A turn that produced a reply, possibly with some audio missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReply {
    /// Audio for each synthesized chunk, in reply order.
    pub audio_references: Vec<AudioReference>,
    /// What the user said (voice turns only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    pub reply_text: String,
    /// Set when some chunks could not be synthesized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Zero-based indices of chunks whose synthesis failed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_chunks: Vec<usize>,
}

/// A turn that could not produce playable reply audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnFailure {
    /// Stage that was running when the turn failed.
    pub stage: TurnState,
    pub error: String,
    /// Pre-recorded clip the client can always play.
    pub fallback_audio_reference: AudioReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_text: Option<String>,
}

/// Result of one conversation turn as delivered to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
    Completed(TurnReply),
    Failed(TurnFailure),
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn reply_text(&self) -> Option<&str> {
        match self {
            Self::Completed(reply) => Some(&reply.reply_text),
            Self::Failed(failure) => failure.reply_text.as_deref(),
        }
    }

    pub fn transcript(&self) -> Option<&str> {
        match self {
            Self::Completed(reply) => reply.transcript.as_deref(),
            Self::Failed(failure) => failure.transcript.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn turn_serializes_with_lowercase_role() {
        let turn = Turn::model("Hi there");
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value, json!({ "role": "model", "text": "Hi there" }));
    }

    #[test]
    fn completed_outcome_is_tagged_and_camel_cased() {
        let outcome = TurnOutcome::Completed(TurnReply {
            audio_references: vec![AudioReference::new("https://cdn/a.mp3")],
            transcript: Some("hello".to_string()),
            reply_text: "Hi!".to_string(),
            warning: None,
            skipped_chunks: vec![],
        });

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["audioReferences"], json!(["https://cdn/a.mp3"]));
        assert_eq!(value["replyText"], "Hi!");
        assert!(value.get("warning").is_none());
        assert!(value.get("skippedChunks").is_none());
    }

    #[test]
    fn failed_outcome_carries_fallback_and_partial_text() {
        let outcome = TurnOutcome::Failed(TurnFailure {
            stage: TurnState::Synthesizing,
            error: "no chunk could be synthesized".to_string(),
            fallback_audio_reference: AudioReference::new("/static/fallback.mp3"),
            transcript: None,
            reply_text: Some("Hello".to_string()),
        });

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["stage"], "synthesizing");
        assert_eq!(value["fallbackAudioReference"], "/static/fallback.mp3");
        assert_eq!(value["replyText"], "Hello");
        assert!(value.get("transcript").is_none());

        let back: TurnOutcome = serde_json::from_value(value).unwrap();
        assert_eq!(back.reply_text(), Some("Hello"));
        assert!(!back.is_completed());
    }
}
