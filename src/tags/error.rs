//! Error types for tag operations
//!
//! The variants fall into four groups:
//!
//! - **Validation**: `InvalidSlug`, `AlreadyExists`, `InvalidValue`
//! - **Resolution**: `NotFound`
//! - **Uniqueness**: `Ambiguous`
//! - **Dependency**: `DependencyFailure`, raised when the message index
//!   rejects an update that a tag mutation depends on

use thiserror::Error;

use super::TagId;
use crate::index::IndexError;

/// Errors that can occur during tag operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TagError {
    /// Slug is not in canonical slug form
    #[error("Invalid tag slug: {0}")]
    InvalidSlug(String),

    /// Slug collides with an existing tag (case-insensitive)
    #[error("Tag already exists: {slug}/{name}")]
    AlreadyExists { slug: String, name: String },

    /// Attribute value does not fit the attribute's type
    #[error("Invalid value '{value}' for tag attribute '{field}'")]
    InvalidValue { field: String, value: String },

    /// Token resolved to no tag
    #[error("No such tag {0}")]
    NotFound(String),

    /// Token resolved to more than one tag where exactly one was required
    #[error("Tag '{token}' is ambiguous ({count} matches)")]
    Ambiguous { token: String, count: usize },

    /// The message index failed while the tag was being changed
    #[error("Message index update failed for tag {tid}: {source}")]
    DependencyFailure {
        tid: TagId,
        #[source]
        source: IndexError,
    },
}

impl TagError {
    /// Whether this is a validation-class error (bad slug or value)
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidSlug(_) | Self::AlreadyExists { .. } | Self::InvalidValue { .. }
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
