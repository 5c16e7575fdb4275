//! Message index seam
//!
//! The engine never owns message membership. It only asks the index which
//! messages carry a tag, how many messages are indexed in total, and asks it
//! to add or remove a tag on a set of messages.
//!
//! [`MemoryIndex`] is a plain in-memory implementation that hosts can use
//! directly and that the tests run against.

pub mod error;
pub mod memory;

pub use error::IndexError;
pub use memory::MemoryIndex;

use crate::base36;
use crate::tags::TagId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identifier of an indexed message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for MessageId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base36::encode(self.0))
    }
}

/// Capability the engine needs from the message index
pub trait MessageIndex {
    /// Set of messages currently tagged with `tid`
    fn messages_with_tag(&self, tid: &TagId) -> HashSet<MessageId>;

    /// Total number of indexed messages
    fn total_message_count(&self) -> usize;

    /// Tag every message in `ids` with `tid`
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if the index rejects the update. Implementations
    /// must not apply a partial update when they fail.
    fn add_tag_to_messages(&mut self, tid: &TagId, ids: &[MessageId]) -> Result<(), IndexError>;

    /// Remove `tid` from every message in `ids`
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if the index rejects the update. Implementations
    /// must not apply a partial update when they fail.
    fn remove_tag_from_messages(&mut self, tid: &TagId, ids: &[MessageId])
    -> Result<(), IndexError>;
}
