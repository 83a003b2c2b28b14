//! Conversation orchestration for the Murmur relay.
//!
//! Threads one user utterance through transcription, generation over the
//! session's accumulated history, and chunked speech synthesis, and decides
//! what the client gets back when any stage fails.

pub mod chunk;
pub mod error;
pub mod orchestrator;
pub mod session;

pub use chunk::split_into_chunks;
pub use error::ConversationError;
pub use orchestrator::{ConversationOrchestrator, PipelineSettings};
pub use session::{InMemorySessionStore, SessionGuard, SessionLocks, SessionStore};
