//! Tag lookup and attribute queries
//!
//! A lookup token may be a tag id, a slug or a display name; they are tried
//! in that order, case-insensitively, and the first class that matches
//! anything wins.
//!
//! Attribute predicates map an attribute name to an expected value, or to
//! [`WILDCARD`] which matches every tag that has the attribute. The result of
//! a query is the intersection of every predicate's matches and the token's
//! matches.
//!
//! # Examples
//!
//! ```
//! use mailtag::query::{self, TagQuery};
//! use mailtag::tags::{TagSpec, TagStore};
//!
//! let mut store = TagStore::new();
//! store.create_tags(vec![
//!     TagSpec::new("Inbox").attr("display", "priority"),
//!     TagSpec::new("New").attr("type", "unread"),
//! ]).unwrap();
//!
//! let unread = query::query_tags(&store, &TagQuery::new().with("type", "unread"));
//! assert_eq!(unread.len(), 1);
//! assert_eq!(unread[0].slug, "new");
//! ```

use std::collections::{BTreeMap, HashSet};

use crate::tags::{TagError, TagId, TagRecord, TagStore, WILDCARD};

/// A tag query: optional lookup token plus attribute predicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagQuery {
    pub token: Option<String>,
    pub predicates: BTreeMap<String, String>,
}

impl TagQuery {
    /// An empty query; matches nothing until given a token or predicate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query matching every tag
    #[must_use]
    pub fn all() -> Self {
        Self::new().with("type", WILDCARD)
    }

    /// Query for a single lookup token
    #[must_use]
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Add an attribute predicate
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.insert(attribute.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.predicates.is_empty()
    }
}

/// Resolve a token to tag ids: by id, then slug, then name
#[must_use]
pub fn resolve_tag(store: &TagStore, token: &str) -> Vec<TagId> {
    let wanted = token.to_lowercase();

    let by_id = TagId::new(wanted.clone());
    if store.contains(&by_id) {
        return vec![by_id];
    }

    let by_slug: Vec<TagId> = store
        .iter()
        .filter(|tag| tag.slug.to_lowercase() == wanted)
        .map(|tag| tag.tid.clone())
        .collect();
    if !by_slug.is_empty() {
        return by_slug;
    }

    store
        .iter()
        .filter(|tag| tag.name.to_lowercase() == wanted)
        .map(|tag| tag.tid.clone())
        .collect()
}

fn matches_predicate(tag: &TagRecord, attribute: &str, wanted: &str) -> bool {
    match tag.attribute(attribute) {
        Some(_) if wanted == WILDCARD => true,
        Some(value) => value.to_lowercase() == wanted,
        None => false,
    }
}

/// Run a query against the store
///
/// With a `display` predicate the result is ordered by (`display_order`,
/// `slug`), otherwise by `slug`. An empty query matches nothing.
#[must_use]
pub fn query_tags<'a>(store: &'a TagStore, query: &TagQuery) -> Vec<&'a TagRecord> {
    if query.is_empty() {
        return Vec::new();
    }

    let token_matches: Option<HashSet<TagId>> = query
        .token
        .as_deref()
        .map(|token| resolve_tag(store, token).into_iter().collect());

    let predicates: Vec<(&str, String)> = query
        .predicates
        .iter()
        .map(|(attribute, value)| (attribute.as_str(), value.to_lowercase()))
        .collect();

    let mut tags: Vec<&TagRecord> = store
        .iter()
        .filter(|tag| {
            token_matches
                .as_ref()
                .is_none_or(|matches| matches.contains(&tag.tid))
        })
        .filter(|tag| {
            predicates
                .iter()
                .all(|(attribute, wanted)| matches_predicate(tag, attribute, wanted))
        })
        .collect();

    if query.predicates.contains_key("display") {
        tags.sort_by(|a, b| {
            a.display_order
                .total_cmp(&b.display_order)
                .then_with(|| a.slug.cmp(&b.slug))
        });
    } else {
        tags.sort_by(|a, b| a.slug.cmp(&b.slug));
    }
    tags
}

/// First tag matching a token, if any
#[must_use]
pub fn get_tag<'a>(store: &'a TagStore, token: &str) -> Option<&'a TagRecord> {
    query_tags(store, &TagQuery::token(token)).into_iter().next()
}

/// Id of the tag matching a token, only when exactly one tag matches
#[must_use]
pub fn get_tag_id(store: &TagStore, token: &str) -> Option<TagId> {
    match query_tags(store, &TagQuery::token(token)).as_slice() {
        [only] => Some(only.tid.clone()),
        _ => None,
    }
}

/// The single tag matching a token
///
/// # Errors
///
/// Returns `TagError::NotFound` if nothing matches and `TagError::Ambiguous`
/// if more than one tag matches.
pub fn resolve_single<'a>(store: &'a TagStore, token: &str) -> Result<&'a TagRecord, TagError> {
    let matches = query_tags(store, &TagQuery::token(token));
    match matches.as_slice() {
        [only] => Ok(only),
        [] => Err(TagError::NotFound(token.to_string())),
        many => Err(TagError::Ambiguous {
            token: token.to_string(),
            count: many.len(),
        }),
    }
}
