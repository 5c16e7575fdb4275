//! Tag statistics and tag info
//!
//! Counts come from the message index. A listing computes the unread set
//! (union over tags of type `unread`) and the exclude set (union over tags
//! with `flag_hides`) once, then asks for per-tag stats with them.
//!
//! Hiding tags are counted without the exclude set, so they still report
//! their own messages, while every other tag has those messages removed.

mod listing;

pub use listing::{ListMode, ListRequest, TagListing, list_tags};

use serde::Serialize;
use std::collections::HashSet;

use crate::index::{MessageId, MessageIndex};
use crate::query::{self, TagQuery};
use crate::tags::{TagId, TagRecord, TagStore};

/// Message counts for one tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TagStats {
    /// Messages carrying the tag, minus excluded ones
    pub all: usize,
    /// Unread messages among `all`
    pub new: usize,
    /// Indexed messages not counted in `all`
    pub not: usize,
    /// `all` plus the messages of every subtag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_all: Option<usize>,
    /// Unread messages among `sum_all`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_new: Option<usize>,
}

/// Compute stats for one tag
///
/// `exclude` is not applied to subtag messages. Sums are only present when
/// `subtags` is non-empty.
pub fn tag_stats<I>(
    index: &I,
    tid: &TagId,
    unread: &HashSet<MessageId>,
    exclude: Option<&HashSet<MessageId>>,
    subtags: &[&TagRecord],
) -> TagStats
where
    I: MessageIndex + ?Sized,
{
    let mut messages = index.messages_with_tag(tid);
    if let Some(exclude) = exclude {
        messages.retain(|id| !exclude.contains(id));
    }

    let all = messages.len();
    let mut stats = TagStats {
        all,
        new: messages.intersection(unread).count(),
        not: index.total_message_count().saturating_sub(all),
        sum_all: None,
        sum_new: None,
    };

    if !subtags.is_empty() {
        for subtag in subtags {
            messages.extend(index.messages_with_tag(&subtag.tid));
        }
        stats.sum_all = Some(messages.len());
        stats.sum_new = Some(messages.intersection(unread).count());
    }

    debug_assert!(stats.new <= stats.all);
    stats
}

/// Message sets shared by every tag of one listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingContext {
    pub unread: HashSet<MessageId>,
    pub exclude: HashSet<MessageId>,
}

impl ListingContext {
    pub fn build<I: MessageIndex + ?Sized>(store: &TagStore, index: &I) -> Self {
        let union_of = |query: TagQuery| {
            query::query_tags(store, &query)
                .into_iter()
                .flat_map(|tag| index.messages_with_tag(&tag.tid))
                .collect::<HashSet<_>>()
        };

        Self {
            unread: union_of(TagQuery::new().with("type", "unread")),
            exclude: union_of(TagQuery::new().with("flag_hides", "true")),
        }
    }

    /// Exclude set to use for `tag`: none for hiding tags
    #[must_use]
    pub fn exclude_for(&self, tag: &TagRecord) -> Option<&HashSet<MessageId>> {
        (!tag.flag_hides).then_some(&self.exclude)
    }

    pub fn stats_for<I: MessageIndex + ?Sized>(
        &self,
        index: &I,
        tag: &TagRecord,
        subtags: &[&TagRecord],
    ) -> TagStats {
        tag_stats(index, &tag.tid, &self.unread, self.exclude_for(tag), subtags)
    }
}

/// A tag record with listing extras
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagInfo {
    #[serde(flatten)]
    pub tag: TagRecord,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtag_ids: Vec<TagId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<TagStats>,

    /// Expanded subtags, one level deep
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtags: Vec<TagInfo>,
}

/// Info for the tag `tid`, with stats when a listing context is given
#[must_use]
pub fn tag_info<I>(
    store: &TagStore,
    index: &I,
    tid: &TagId,
    context: Option<&ListingContext>,
    subtags: &[&TagRecord],
) -> Option<TagInfo>
where
    I: MessageIndex + ?Sized,
{
    let tag = store.get(tid)?;
    Some(TagInfo {
        tag: tag.clone(),
        subtag_ids: subtags.iter().map(|sub| sub.tid.clone()).collect(),
        stats: context.map(|ctx| ctx.stats_for(index, tag, subtags)),
        subtags: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndex;
    use crate::tags::TagSpec;

    fn ids(range: std::ops::Range<u64>) -> Vec<MessageId> {
        range.map(MessageId::new).collect()
    }

    /// Tag A on 0..10, unread on 0..3, hiding tag B on 8..10
    fn hiding_fixture() -> (TagStore, MemoryIndex, TagId, TagId) {
        let mut store = TagStore::new();
        let created = store
            .create_tags(vec![
                TagSpec::new("A"),
                TagSpec::new("B").attr("flag_hides", "true"),
                TagSpec::new("New").attr("type", "unread"),
            ])
            .unwrap();
        let (a, b, new) = (
            created[0].tid.clone(),
            created[1].tid.clone(),
            created[2].tid.clone(),
        );

        let mut index = MemoryIndex::with_messages(20);
        index.add_tag_to_messages(&a, &ids(0..10)).unwrap();
        index.add_tag_to_messages(&new, &ids(0..3)).unwrap();
        index.add_tag_to_messages(&b, &ids(8..10)).unwrap();
        (store, index, a, b)
    }

    #[test]
    fn test_stats_without_exclusion() {
        let (_, index, a, _) = hiding_fixture();
        let unread: HashSet<_> = ids(0..3).into_iter().collect();

        let stats = tag_stats(&index, &a, &unread, None, &[]);
        assert_eq!(stats.all, 10);
        assert_eq!(stats.new, 3);
        assert_eq!(stats.not, 10);
        assert_eq!(stats.sum_all, None);
    }

    #[test]
    fn test_hiding_tag_excluded_from_others() {
        let (store, index, a, _) = hiding_fixture();
        let ctx = ListingContext::build(&store, &index);
        assert_eq!(ctx.exclude.len(), 2);
        assert_eq!(ctx.unread.len(), 3);

        let stats = tag_stats(&index, &a, &ctx.unread, Some(&ctx.exclude), &[]);
        assert_eq!(stats.all, 8);
        assert_eq!(stats.new, 3);
        assert_eq!(stats.not, 12);
    }

    #[test]
    fn test_hiding_tag_counts_itself() {
        let (store, index, _, b) = hiding_fixture();
        let ctx = ListingContext::build(&store, &index);
        let tag_b = store.get(&b).unwrap();

        assert!(ctx.exclude_for(tag_b).is_none());
        assert_eq!(ctx.stats_for(&index, tag_b, &[]).all, 2);
    }

    #[test]
    fn test_subtag_sums_skip_exclusion() {
        let (mut store, mut index, a, _) = hiding_fixture();
        let child = store
            .create_tags(vec![TagSpec::new("Child").attr("parent", a.as_str())])
            .unwrap()
            .remove(0);
        // 9 is hidden by B but still counted through the subtag
        index.add_tag_to_messages(&child.tid, &ids(9..12)).unwrap();

        let ctx = ListingContext::build(&store, &index);
        let subtags = store.children(&a);
        let stats = ctx.stats_for(&index, store.get(&a).unwrap(), &subtags);

        assert_eq!(stats.all, 8);
        assert_eq!(stats.sum_all, Some(11));
        assert_eq!(stats.sum_new, Some(3));
        assert!(stats.sum_all.unwrap() >= stats.all);
    }

    #[test]
    fn test_tag_info_serializes_flat() {
        let (store, index, a, _) = hiding_fixture();
        let ctx = ListingContext::build(&store, &index);
        let info = tag_info(&store, &index, &a, Some(&ctx), &[]).unwrap();

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["tid"], a.as_str());
        assert_eq!(value["slug"], "a");
        assert_eq!(value["stats"]["all"], 8);
        assert!(value.get("subtag_ids").is_none());
        assert!(value["stats"].get("sum_all").is_none());
    }

    #[test]
    fn test_tag_info_unknown_and_without_stats() {
        let (store, index, a, _) = hiding_fixture();
        assert!(tag_info(&store, &index, &TagId::new("zz"), None, &[]).is_none());
        assert!(tag_info(&store, &index, &a, None, &[]).unwrap().stats.is_none());
    }
}
