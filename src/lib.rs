//! Mailtag - tag and auto-tagging filter metadata for mail clients
//!
//! This library keeps the tags of a mail store, the ordered filters that
//! apply them automatically, and the per-tag message statistics shown in
//! tag listings. Message membership itself lives in a message index behind
//! the [`index::MessageIndex`] trait.

use thiserror::Error;

pub mod base36;
pub mod config;
pub mod engine;
pub mod filters;
pub mod index;
pub mod query;
pub mod stats;
pub mod tags;

#[cfg(test)]
pub mod testing;

pub use engine::Registry;

/// Error enum, contains all failure states of the library
#[derive(Debug, Error)]
pub enum MailtagError {
    /// Tag store error
    #[error("Tag error: {0}")]
    Tag(#[from] tags::TagError),
    /// Filter list error
    #[error("Filter error: {0}")]
    Filter(#[from] filters::FilterError),
    /// Message index error
    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// Registry snapshot could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MailtagError>;
