use thiserror::Error;

/// Errors returned before a turn touches any state.
///
/// Stage failures are not errors at this level: they become a
/// [`murmur_types::TurnOutcome::Failed`] value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
