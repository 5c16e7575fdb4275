//! Error types for message index operations

use thiserror::Error;

use super::MessageId;

/// Failures reported by a [`MessageIndex`](super::MessageIndex) implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The message is not part of the index
    #[error("Unknown message: {0}")]
    UnknownMessage(MessageId),

    /// The index refused or could not complete the update
    #[error("Message index unavailable: {0}")]
    Unavailable(String),
}
