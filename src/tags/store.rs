//! Tag store: creation, deletion, mutation and display-order recompute

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use super::error::TagError;
use super::slug::validate_slug;
use super::types::{TagId, TagRecord, TagSpec};
use crate::index::MessageIndex;
use crate::query;

/// Outcome of a best-effort tag deletion batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteReport {
    /// Records that were removed, in request order
    pub removed: Vec<TagRecord>,
    /// Tokens that could not be deleted, with the reason
    pub failures: Vec<(String, TagError)>,
}

/// Mapping from tag id to tag record
///
/// Ids are allocated from a counter that only ever grows, so an id is never
/// handed out twice even after the tag holding it was deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagStore {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    tags: BTreeMap<TagId, TagRecord>,
}

impl TagStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    #[must_use]
    pub fn get(&self, tid: &TagId) -> Option<&TagRecord> {
        self.tags.get(tid)
    }

    #[must_use]
    pub fn contains(&self, tid: &TagId) -> bool {
        self.tags.contains_key(tid)
    }

    /// Iterate over all tags in id order
    pub fn iter(&self) -> impl Iterator<Item = &TagRecord> {
        self.tags.values()
    }

    /// Tags whose `parent` is `tid`, ordered by (`display_order`, `slug`)
    #[must_use]
    pub fn children(&self, tid: &TagId) -> Vec<&TagRecord> {
        let mut children: Vec<&TagRecord> = self
            .tags
            .values()
            .filter(|tag| tag.parent.as_ref() == Some(tid))
            .collect();
        children.sort_by(|a, b| {
            a.display_order
                .total_cmp(&b.display_order)
                .then_with(|| a.slug.cmp(&b.slug))
        });
        children
    }

    /// Find the tag holding `slug`, ignoring case
    #[must_use]
    pub fn find_by_slug(&self, slug: &str) -> Option<&TagRecord> {
        self.tags
            .values()
            .find(|tag| tag.slug.eq_ignore_ascii_case(slug))
    }

    fn allocate_id(&mut self) -> TagId {
        loop {
            self.next_id += 1;
            let tid = TagId::from_ordinal(self.next_id);
            if !self.tags.contains_key(&tid) {
                return tid;
            }
        }
    }

    /// Create a batch of tags
    ///
    /// The batch is all-or-nothing: every spec is validated before anything
    /// is inserted. On success the display order of all tags is recomputed.
    ///
    /// # Errors
    ///
    /// Returns `TagError::InvalidSlug` if a slug is not canonical,
    /// `TagError::AlreadyExists` if a slug collides with an existing tag or
    /// another spec in the batch, or `TagError::InvalidValue` if an attribute
    /// override does not fit its field.
    pub fn create_tags(&mut self, specs: Vec<TagSpec>) -> Result<Vec<TagRecord>, TagError> {
        let mut batch_slugs = HashSet::new();
        let mut drafts = Vec::with_capacity(specs.len());

        for spec in specs {
            let slug = spec.effective_slug();
            validate_slug(&slug)?;

            if let Some(existing) = self.find_by_slug(&slug) {
                return Err(TagError::AlreadyExists {
                    slug: existing.slug.clone(),
                    name: existing.name.clone(),
                });
            }
            if !batch_slugs.insert(slug.to_ascii_lowercase()) {
                return Err(TagError::AlreadyExists {
                    slug,
                    name: spec.name,
                });
            }

            let mut draft = TagRecord::new(TagId::new(""), spec.name.clone(), slug);
            for (key, value) in &spec.attributes {
                if key == "slug" {
                    continue;
                }
                draft.set_attribute(key, value)?;
            }
            drafts.push(draft);
        }

        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let mut created = Vec::with_capacity(drafts.len());
        for mut draft in drafts {
            draft.tid = self.allocate_id();
            info!(tid = %draft.tid, slug = %draft.slug, "created tag");
            created.push(draft.tid.clone());
            self.tags.insert(draft.tid.clone(), draft);
        }

        self.reorder_all();

        Ok(created
            .iter()
            .filter_map(|tid| self.tags.get(tid).cloned())
            .collect())
    }

    /// Update attributes of one tag in place
    ///
    /// All attributes are applied to a copy first, so a failing attribute
    /// leaves the stored record untouched.
    ///
    /// # Errors
    ///
    /// Returns `TagError::NotFound` for an unknown id, a validation error if a
    /// value does not fit its field or a new slug collides with another tag.
    pub fn mutate<K, V>(&mut self, tid: &TagId, attrs: &[(K, V)]) -> Result<&TagRecord, TagError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let current = self
            .tags
            .get(tid)
            .ok_or_else(|| TagError::NotFound(tid.to_string()))?;

        let mut updated = current.clone();
        for (key, value) in attrs {
            updated.set_attribute(key.as_ref(), value.as_ref())?;
        }

        if !updated.slug.eq_ignore_ascii_case(&current.slug)
            && let Some(other) = self.find_by_slug(&updated.slug)
        {
            return Err(TagError::AlreadyExists {
                slug: other.slug.clone(),
                name: other.name.clone(),
            });
        }

        debug!(tid = %tid, "updated tag attributes");
        self.tags.insert(tid.clone(), updated);
        Ok(&self.tags[tid])
    }

    /// Remove a record without touching the message index or display order
    pub fn remove_record(&mut self, tid: &TagId) -> Option<TagRecord> {
        self.tags.remove(tid)
    }

    /// Delete tags by id, slug or name
    ///
    /// Each token is resolved on its own. A tag is first removed from every
    /// message that carries it; only if the index accepts that is the record
    /// deleted. Failures are collected per token and never stop the batch.
    /// Display order is recomputed if anything was deleted.
    ///
    /// Filters referring to a deleted tag are left as they are.
    pub fn delete_tags<I, S>(&mut self, tokens: &[S], index: &mut I) -> DeleteReport
    where
        I: MessageIndex + ?Sized,
        S: AsRef<str>,
    {
        let mut report = DeleteReport::default();

        for token in tokens {
            let token = token.as_ref();
            let Some(tid) = query::get_tag(self, token).map(|tag| tag.tid.clone()) else {
                warn!(token, "no such tag");
                report
                    .failures
                    .push((token.to_string(), TagError::NotFound(token.to_string())));
                continue;
            };

            let mut tagged: Vec<_> = index.messages_with_tag(&tid).into_iter().collect();
            tagged.sort();
            if let Err(source) = index.remove_tag_from_messages(&tid, &tagged) {
                warn!(tid = %tid, error = %source, "untagging failed, keeping tag");
                report
                    .failures
                    .push((token.to_string(), TagError::DependencyFailure { tid, source }));
                continue;
            }

            if let Some(record) = self.tags.remove(&tid) {
                info!(tid = %tid, slug = %record.slug, untagged = tagged.len(), "deleted tag");
                report.removed.push(record);
            }
        }

        if !report.removed.is_empty() {
            self.reorder_all();
        }
        report
    }

    /// Recompute `display_order` for every tag
    ///
    /// Tags are sorted by (`display`, `display_order`, `slug`, `tid`) and
    /// numbered 1..N in that order. Display contexts compare by name, so
    /// `archive` groups come first and `tag` groups last.
    pub fn reorder_all(&mut self) {
        let mut order: Vec<(&TagId, &TagRecord)> = self.tags.iter().collect();
        order.sort_by(|(a_id, a), (b_id, b)| {
            a.display
                .as_str()
                .cmp(b.display.as_str())
                .then_with(|| a.display_order.total_cmp(&b.display_order))
                .then_with(|| a.slug.cmp(&b.slug))
                .then_with(|| a_id.cmp(b_id))
        });
        let order: Vec<TagId> = order.into_iter().map(|(tid, _)| tid.clone()).collect();

        for (position, tid) in order.iter().enumerate() {
            if let Some(tag) = self.tags.get_mut(tid) {
                tag.display_order = (position + 1) as f64;
            }
        }
        debug_assert!(
            self.tags
                .values()
                .all(|tag| tag.display_order >= 1.0 && tag.display_order <= self.tags.len() as f64),
            "display order outside 1..=N"
        );
        debug!(count = order.len(), "recomputed tag display order");
    }
}
