//! Error types for filter operations

use thiserror::Error;

use crate::tags::TagError;

/// Errors that can occur during filter operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    /// No filter at this position, or no filter with these terms
    #[error("Filter '{0}' not found")]
    NotFound(String),

    /// Text is not a base-36 position key
    #[error("Invalid filter position '{0}'")]
    InvalidPosition(String),

    /// Malformed tag action token (expected `+tag` or `-tag`)
    #[error("Invalid tag action '{0}'")]
    InvalidAction(String),

    /// Unknown filter type name
    #[error("Invalid filter type '{0}'")]
    InvalidType(String),

    /// Request is missing required parts
    #[error("Usage: {0}")]
    Usage(String),

    /// A tag named by the filter could not be resolved
    #[error("Tag error: {0}")]
    Tag(#[from] TagError),
}
