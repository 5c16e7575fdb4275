//! Testing utilities for mailtag
//!
//! This module provides a `FlakyIndex` wrapper that fails index mutations
//! for chosen tags, used to exercise the per-target atomicity of deletes and
//! message tagging.
//!
//! Only available when compiled with `cfg(test)`.

use std::collections::HashSet;

use crate::index::{IndexError, MemoryIndex, MessageId, MessageIndex};
use crate::tags::{TagId, TagSpec, TagStore};

/// Message index whose mutations fail for a fixed set of tags
///
/// Reads and mutations of every other tag go to the wrapped `MemoryIndex`.
pub struct FlakyIndex {
    inner: MemoryIndex,
    failing: HashSet<TagId>,
}

impl FlakyIndex {
    pub fn failing_for(inner: MemoryIndex, failing: impl IntoIterator<Item = TagId>) -> Self {
        Self {
            inner,
            failing: failing.into_iter().collect(),
        }
    }

    #[must_use]
    pub const fn inner(&self) -> &MemoryIndex {
        &self.inner
    }

    fn check(&self, tid: &TagId) -> Result<(), IndexError> {
        if self.failing.contains(tid) {
            return Err(IndexError::Unavailable(format!("index locked for tag {tid}")));
        }
        Ok(())
    }
}

impl MessageIndex for FlakyIndex {
    fn messages_with_tag(&self, tid: &TagId) -> HashSet<MessageId> {
        self.inner.messages_with_tag(tid)
    }

    fn total_message_count(&self) -> usize {
        self.inner.total_message_count()
    }

    fn add_tag_to_messages(&mut self, tid: &TagId, ids: &[MessageId]) -> Result<(), IndexError> {
        self.check(tid)?;
        self.inner.add_tag_to_messages(tid, ids)
    }

    fn remove_tag_from_messages(&mut self, tid: &TagId, ids: &[MessageId]) -> Result<(), IndexError> {
        self.check(tid)?;
        self.inner.remove_tag_from_messages(tid, ids)
    }
}

/// Store holding one plain tag per name
///
/// # Panics
/// Panics if a name does not make a valid, unique slug.
pub fn store_with(names: &[&str]) -> TagStore {
    let mut store = TagStore::new();
    store
        .create_tags(names.iter().map(|name| TagSpec::new(*name)).collect())
        .expect("Failed to create test tags");
    store
}

/// Message ids for a list of ordinals
pub fn msgs(ids: &[u64]) -> Vec<MessageId> {
    ids.iter().copied().map(MessageId::new).collect()
}
