//! In-memory message index
//!
//! Keeps a reverse index `tag -> messages` plus the set of known messages.
//! Nothing is persisted.

use super::{IndexError, MessageId, MessageIndex};
use crate::tags::TagId;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Message index backed by hash maps
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    messages: BTreeSet<MessageId>,
    tags: HashMap<TagId, HashSet<MessageId>>,
}

impl MemoryIndex {
    /// Create an empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index holding messages `0..count`
    #[must_use]
    pub fn with_messages(count: u64) -> Self {
        let mut index = Self::new();
        for id in 0..count {
            index.insert_message(MessageId::new(id));
        }
        index
    }

    /// Register a message; returns `false` if it was already indexed
    pub fn insert_message(&mut self, id: MessageId) -> bool {
        self.messages.insert(id)
    }

    /// Drop a message and all of its tag memberships
    pub fn remove_message(&mut self, id: MessageId) -> bool {
        for members in self.tags.values_mut() {
            members.remove(&id);
        }
        self.messages.remove(&id)
    }

    /// Check if a message carries a tag
    #[must_use]
    pub fn has_tag(&self, id: MessageId, tid: &TagId) -> bool {
        self.tags.get(tid).is_some_and(|members| members.contains(&id))
    }

    /// All tags present on a message, sorted
    #[must_use]
    pub fn tags_of(&self, id: MessageId) -> Vec<TagId> {
        let mut tids: Vec<TagId> = self
            .tags
            .iter()
            .filter(|(_, members)| members.contains(&id))
            .map(|(tid, _)| tid.clone())
            .collect();
        tids.sort();
        tids
    }

    fn check_known(&self, ids: &[MessageId]) -> Result<(), IndexError> {
        match ids.iter().find(|id| !self.messages.contains(id)) {
            Some(id) => Err(IndexError::UnknownMessage(*id)),
            None => Ok(()),
        }
    }
}

impl MessageIndex for MemoryIndex {
    fn messages_with_tag(&self, tid: &TagId) -> HashSet<MessageId> {
        self.tags.get(tid).cloned().unwrap_or_default()
    }

    fn total_message_count(&self) -> usize {
        self.messages.len()
    }

    fn add_tag_to_messages(&mut self, tid: &TagId, ids: &[MessageId]) -> Result<(), IndexError> {
        self.check_known(ids)?;
        self.tags.entry(tid.clone()).or_default().extend(ids.iter().copied());
        Ok(())
    }

    fn remove_tag_from_messages(
        &mut self,
        tid: &TagId,
        ids: &[MessageId],
    ) -> Result<(), IndexError> {
        self.check_known(ids)?;
        if let Some(members) = self.tags.get_mut(tid) {
            for id in ids {
                members.remove(id);
            }
            if members.is_empty() {
                self.tags.remove(tid);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u64]) -> Vec<MessageId> {
        values.iter().copied().map(MessageId::new).collect()
    }

    #[test]
    fn test_add_and_lookup() {
        let mut index = MemoryIndex::with_messages(5);
        let tid = TagId::new("a");

        index.add_tag_to_messages(&tid, &ids(&[1, 3])).unwrap();

        assert_eq!(index.messages_with_tag(&tid).len(), 2);
        assert!(index.has_tag(MessageId::new(3), &tid));
        assert!(!index.has_tag(MessageId::new(2), &tid));
        assert_eq!(index.total_message_count(), 5);
    }

    #[test]
    fn test_unknown_message_rejects_whole_update() {
        let mut index = MemoryIndex::with_messages(2);
        let tid = TagId::new("a");

        let result = index.add_tag_to_messages(&tid, &ids(&[0, 9]));

        assert_eq!(result, Err(IndexError::UnknownMessage(MessageId::new(9))));
        assert!(index.messages_with_tag(&tid).is_empty());
    }

    #[test]
    fn test_remove_tag_cleans_empty_entry() {
        let mut index = MemoryIndex::with_messages(3);
        let tid = TagId::new("b");
        index.add_tag_to_messages(&tid, &ids(&[0, 1])).unwrap();

        index.remove_tag_from_messages(&tid, &ids(&[0, 1])).unwrap();

        assert!(index.messages_with_tag(&tid).is_empty());
        assert!(index.tags_of(MessageId::new(0)).is_empty());
    }

    #[test]
    fn test_remove_message_drops_memberships() {
        let mut index = MemoryIndex::with_messages(3);
        let tid = TagId::new("c");
        index.add_tag_to_messages(&tid, &ids(&[2])).unwrap();

        assert!(index.remove_message(MessageId::new(2)));

        assert_eq!(index.total_message_count(), 2);
        assert!(index.messages_with_tag(&tid).is_empty());
    }
}
