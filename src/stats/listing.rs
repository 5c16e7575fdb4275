//! The tag listing command

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::{ListingContext, TagInfo, tag_info};
use crate::index::MessageIndex;
use crate::query::{self, TagQuery};
use crate::tags::{DisplayContext, TagError, TagRecord, TagStore};

/// How subtags are presented in a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    /// Every tag at top level; subtags expanded only for wanted tags
    #[default]
    Default,
    /// Every tag at top level, never expanded
    Flat,
    /// Only root tags, with subtags expanded beneath them
    Tree,
    /// Every tag at top level, with subtags also expanded
    Both,
}

impl ListMode {
    pub const ALL: &'static [Self] = &[Self::Default, Self::Flat, Self::Tree, Self::Both];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Flat => "flat",
            Self::Tree => "tree",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for ListMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListMode {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| TagError::InvalidValue {
                field: "mode".to_string(),
                value: s.to_string(),
            })
    }
}

/// Arguments of a tag listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Attribute predicates (`key=value` arguments)
    pub search: BTreeMap<String, String>,
    /// Slugs to list; everything when empty
    pub wanted: Vec<String>,
    /// Slugs to leave out (`!slug` arguments)
    pub unwanted: Vec<String>,
    /// Falls back to [`ListMode::Default`]
    pub mode: Option<ListMode>,
    /// List `invisible` tags even without any filter
    pub show_invisible: bool,
}

impl ListRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse command-line style arguments
    ///
    /// `key=value` becomes a predicate (`mode=...` selects the mode),
    /// `!slug` an unwanted slug and anything else a wanted slug.
    ///
    /// # Errors
    ///
    /// Returns `TagError::InvalidValue` for an unknown mode.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, TagError> {
        let mut request = Self::new();
        for arg in args {
            let arg = arg.as_ref();
            if let Some((key, value)) = arg.split_once('=') {
                let (key, value) = (key.trim(), value.trim());
                if key == "mode" {
                    request.mode = Some(value.parse()?);
                } else {
                    request.search.insert(key.to_string(), value.to_string());
                }
            } else if let Some(slug) = arg.strip_prefix('!') {
                request.unwanted.push(slug.to_lowercase());
            } else {
                request.wanted.push(arg.to_lowercase());
            }
        }
        Ok(request)
    }

    #[must_use]
    pub fn mode(mut self, mode: ListMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn want(mut self, slug: impl Into<String>) -> Self {
        self.wanted.push(slug.into().to_lowercase());
        self
    }

    #[must_use]
    pub fn unwant(mut self, slug: impl Into<String>) -> Self {
        self.unwanted.push(slug.into().to_lowercase());
        self
    }

    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.search.insert(attribute.into(), value.into());
        self
    }

    fn has_filter(&self) -> bool {
        !self.wanted.is_empty() || !self.unwanted.is_empty() || !self.search.is_empty()
    }
}

/// Result of a tag listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagListing {
    pub search: BTreeMap<String, String>,
    pub wanted: Vec<String>,
    pub unwanted: Vec<String>,
    pub tags: Vec<TagInfo>,
}

const COLUMNS: usize = 3;

impl fmt::Display for TagListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, info) in self.tags.iter().enumerate() {
            let count = info
                .stats
                .map(|stats| stats.sum_new.unwrap_or(stats.new))
                .filter(|&n| n > 0)
                .map(|n| n.to_string())
                .unwrap_or_default();
            let name: String = info.tag.name.chars().take(18).collect();

            if i % COLUMNS == 0 {
                f.write_str("  ")?;
            }
            write!(f, "{count:>5.5} {name:<18}")?;
            if i % COLUMNS == COLUMNS - 1 {
                writeln!(f)?;
            }
        }
        writeln!(f)
    }
}

fn is_wanted(tag: &TagRecord, wanted: &[String], unwanted: &[String]) -> bool {
    let slug = tag.slug.to_lowercase();
    (wanted.is_empty() || wanted.contains(&slug)) && !unwanted.contains(&slug)
}

/// List tags with stats
///
/// Tags are matched by the request's predicates (every tag when there are
/// none), in slug order. Each listed tag carries stats and the ids of its
/// subtags; depending on the mode the subtags are also listed beneath it.
pub fn list_tags<I>(store: &TagStore, index: &I, request: &ListRequest) -> TagListing
where
    I: MessageIndex + ?Sized,
{
    let context = ListingContext::build(store, index);
    let mode = request.mode.unwrap_or_default();

    let query = if request.search.is_empty() {
        TagQuery::all()
    } else {
        TagQuery {
            token: None,
            predicates: request.search.clone(),
        }
    };

    let mut tags = Vec::new();
    for tag in query::query_tags(store, &query) {
        if !is_wanted(tag, &request.wanted, &request.unwanted) {
            continue;
        }
        if mode == ListMode::Tree && tag.parent.is_some() && request.wanted.is_empty() {
            continue;
        }
        if !request.has_filter() && !request.show_invisible && tag.display == DisplayContext::Invisible {
            continue;
        }

        let subtags = store.children(&tag.tid);
        let Some(mut info) = tag_info(store, index, &tag.tid, Some(&context), &subtags) else {
            continue;
        };

        let expand = matches!(mode, ListMode::Both | ListMode::Tree)
            || (!request.wanted.is_empty() && mode != ListMode::Flat);
        if expand && !subtags.is_empty() {
            let wanted: Vec<String> = subtags.iter().map(|sub| sub.slug.to_lowercase()).collect();
            info.subtags = query::query_tags(store, &TagQuery::all())
                .into_iter()
                .filter(|sub| is_wanted(sub, &wanted, &[]))
                .filter_map(|sub| tag_info(store, index, &sub.tid, Some(&context), &[]))
                .collect();
        }

        tags.push(info);
    }

    debug!(count = tags.len(), mode = %mode, "listed tags");
    TagListing {
        search: request.search.clone(),
        wanted: request.wanted.clone(),
        unwanted: request.unwanted.clone(),
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{MemoryIndex, MessageId};
    use crate::tags::TagSpec;

    fn fixture() -> (TagStore, MemoryIndex) {
        let mut store = TagStore::new();
        store
            .create_tags(vec![
                TagSpec::new("Inbox").attr("display", "priority"),
                TagSpec::new("Projects"),
                TagSpec::new("New").attr("type", "unread").attr("display", "invisible"),
            ])
            .unwrap();
        let projects = store.find_by_slug("projects").unwrap().tid.to_string();
        store
            .create_tags(vec![
                TagSpec::new("Rust").attr("parent", projects.as_str()),
                TagSpec::new("Go").attr("parent", projects.as_str()),
            ])
            .unwrap();

        let mut index = MemoryIndex::with_messages(10);
        let tid = |slug: &str| store.find_by_slug(slug).unwrap().tid.clone();
        let msgs = |ids: &[u64]| ids.iter().copied().map(MessageId::new).collect::<Vec<_>>();
        index.add_tag_to_messages(&tid("inbox"), &msgs(&[0, 1, 2])).unwrap();
        index.add_tag_to_messages(&tid("projects"), &msgs(&[3])).unwrap();
        index.add_tag_to_messages(&tid("rust"), &msgs(&[4, 5])).unwrap();
        index.add_tag_to_messages(&tid("new"), &msgs(&[0, 4])).unwrap();
        (store, index)
    }

    fn slugs(listing: &TagListing) -> Vec<&str> {
        listing.tags.iter().map(|info| info.tag.slug.as_str()).collect()
    }

    #[test]
    fn test_default_listing_hides_invisible() {
        let (store, index) = fixture();
        let listing = list_tags(&store, &index, &ListRequest::new());

        assert_eq!(slugs(&listing), vec!["go", "inbox", "projects", "rust"]);
        assert!(listing.tags.iter().all(|info| info.subtags.is_empty()));
    }

    #[test]
    fn test_show_invisible() {
        let (store, index) = fixture();
        let request = ListRequest {
            show_invisible: true,
            ..ListRequest::new()
        };
        assert!(slugs(&list_tags(&store, &index, &request)).contains(&"new"));
    }

    #[test]
    fn test_any_filter_reveals_invisible() {
        let (store, index) = fixture();
        let listing = list_tags(&store, &index, &ListRequest::new().unwant("inbox"));
        assert_eq!(slugs(&listing), vec!["go", "new", "projects", "rust"]);
    }

    #[test]
    fn test_tree_mode_nests_subtags() {
        let (store, index) = fixture();
        let listing = list_tags(&store, &index, &ListRequest::new().mode(ListMode::Tree));

        assert_eq!(slugs(&listing), vec!["inbox", "projects"]);
        let projects = &listing.tags[1];
        assert_eq!(projects.subtag_ids.len(), 2);
        let nested: Vec<_> = projects.subtags.iter().map(|i| i.tag.slug.as_str()).collect();
        assert_eq!(nested, vec!["go", "rust"]);

        let stats = projects.stats.unwrap();
        assert_eq!(stats.all, 1);
        assert_eq!(stats.sum_all, Some(3));
        assert_eq!(stats.sum_new, Some(1));
    }

    #[test]
    fn test_wanted_expands_unless_flat() {
        let (store, index) = fixture();

        let listing = list_tags(&store, &index, &ListRequest::new().want("Projects"));
        assert_eq!(slugs(&listing), vec!["projects"]);
        assert_eq!(listing.tags[0].subtags.len(), 2);

        let flat = list_tags(
            &store,
            &index,
            &ListRequest::new().want("projects").mode(ListMode::Flat),
        );
        assert!(flat.tags[0].subtags.is_empty());
        assert_eq!(flat.tags[0].subtag_ids.len(), 2);
    }

    #[test]
    fn test_attribute_search() {
        let (store, index) = fixture();
        let listing = list_tags(&store, &index, &ListRequest::new().with("display", "priority"));
        assert_eq!(slugs(&listing), vec!["inbox"]);
    }

    #[test]
    fn test_from_args() {
        let request = ListRequest::from_args(&["Inbox", "!spam", "display = tag", "mode=both"]).unwrap();
        assert_eq!(request.wanted, vec!["inbox"]);
        assert_eq!(request.unwanted, vec!["spam"]);
        assert_eq!(request.search.get("display").map(String::as_str), Some("tag"));
        assert_eq!(request.mode, Some(ListMode::Both));

        assert!(ListRequest::from_args(&["mode=sideways"]).is_err());
    }

    #[test]
    fn test_text_rendering() {
        let (store, index) = fixture();
        let listing = list_tags(&store, &index, &ListRequest::new().mode(ListMode::Flat));
        let text = listing.to_string();

        let first_line = text.lines().next().unwrap();
        assert!(first_line.starts_with("  "));
        assert!(first_line.contains("Inbox"));
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 2);
    }
}
