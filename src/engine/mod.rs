//! The engine root
//!
//! A [`Registry`] owns the tag store, the filter list and the engine
//! configuration. Hosts create one at startup and pass it (or a lock around
//! it) to whatever needs tag or filter metadata; there is no global instance.
//!
//! Read access goes through the lookup methods here. Batch commands that
//! report per-item results live in [`commands`].
//!
//! # Examples
//!
//! ```
//! use mailtag::engine::Registry;
//! use mailtag::index::MemoryIndex;
//! use mailtag::tags::TagSpec;
//!
//! let mut registry = Registry::new();
//! registry.add_tags(vec![TagSpec::new("Work")]).unwrap();
//!
//! let work = registry.get_tag("WORK").unwrap();
//! assert_eq!(work.slug, "work");
//! assert_eq!(work.display_order, 1.0);
//!
//! let index = MemoryIndex::with_messages(3);
//! let info = registry.get_tag_info("work", &index, true).unwrap();
//! assert_eq!(info.stats.unwrap().not, 3);
//! ```

pub mod commands;


pub use commands::{
    AddFilterOutcome, AddTagsOutcome, DeleteFiltersOutcome, DeleteTagsOutcome, FilterRequest,
    FilterTable, TagMessagesOutcome,
};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::filters::{
    FIRST_POSITION, FilterError, FilterList, FilterPosition, FilterRecord, TypeSelection,
};
use crate::index::MessageIndex;
use crate::query::{self, TagQuery};
use crate::stats::{self, ListRequest, ListingContext, TagInfo, TagListing};
use crate::tags::{TagError, TagId, TagRecord, TagStore};
use crate::{MailtagError, Result};

/// Tag and filter metadata of one mail store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    tags: TagStore,
    filters: FilterList,
    config: EngineConfig,
}

/// Persisted part of a registry
#[derive(Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    tags: TagStore,
    #[serde(default)]
    filters: FilterList,
}

impl Registry {
    /// Empty registry with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn tags(&self) -> &TagStore {
        &self.tags
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterList {
        &self.filters
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// First tag matching a token (id, slug or name)
    #[must_use]
    pub fn get_tag(&self, token: &str) -> Option<&TagRecord> {
        query::get_tag(&self.tags, token)
    }

    #[must_use]
    pub fn get_tags(&self, query: &TagQuery) -> Vec<&TagRecord> {
        query::query_tags(&self.tags, query)
    }

    /// Id of the only tag matching a token
    #[must_use]
    pub fn get_tag_id(&self, token: &str) -> Option<TagId> {
        query::get_tag_id(&self.tags, token)
    }

    /// Tag info for a token, with subtag ids and optionally stats
    #[must_use]
    pub fn get_tag_info<I>(&self, token: &str, index: &I, with_stats: bool) -> Option<TagInfo>
    where
        I: MessageIndex + ?Sized,
    {
        let tag = self.get_tag(token)?;
        let subtags = self.tags.children(&tag.tid);
        let context = with_stats.then(|| ListingContext::build(&self.tags, index));
        stats::tag_info(&self.tags, index, &tag.tid, context.as_ref(), &subtags)
    }

    /// Filters by type in position order
    ///
    /// `types` falls back to the configured default filter types.
    #[must_use]
    pub fn get_filters(
        &self,
        filter_on: Option<&str>,
        types: Option<&TypeSelection>,
    ) -> Vec<(FilterPosition, &FilterRecord)> {
        match types {
            Some(types) => self.filters.list(filter_on, types),
            None => self.filters.list(filter_on, &self.config.filter_types()),
        }
    }

    /// Move a filter to a new position
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidPosition` if either position lies
    /// outside the positions in use. The list is left unchanged.
    pub fn move_filter(&mut self, from: FilterPosition, to: FilterPosition) -> std::result::Result<(), FilterError> {
        let end = self.filters.next_position();
        for position in [from, to] {
            if position.ordinal() < FIRST_POSITION || position >= end {
                return Err(FilterError::InvalidPosition(position.to_string()));
            }
        }
        self.filters.move_filter(from, to);
        Ok(())
    }

    /// Positions of filters with an action on `tid`
    #[must_use]
    pub fn filters_referencing(&self, tid: &TagId) -> Vec<FilterPosition> {
        self.filters.referencing(tid)
    }

    /// Update attributes of the tag matching `token`
    ///
    /// # Errors
    ///
    /// Returns `TagError::NotFound` / `TagError::Ambiguous` unless exactly
    /// one tag matches, or a validation error from the update.
    pub fn mutate_tag<K, V>(&mut self, token: &str, attrs: &[(K, V)]) -> std::result::Result<&TagRecord, TagError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let tid = query::resolve_single(&self.tags, token)?.tid.clone();
        self.tags.mutate(&tid, attrs)
    }

    /// List tags with stats, applying configured defaults
    #[must_use]
    pub fn list_tags<I>(&self, request: &ListRequest, index: &I) -> TagListing
    where
        I: MessageIndex + ?Sized,
    {
        let mut request = request.clone();
        request.mode = request.mode.or(Some(self.config.default_list_mode));
        request.show_invisible |= !self.config.hide_invisible;
        stats::list_tags(&self.tags, index, &request)
    }

    /// Serialize tags and filters to TOML
    ///
    /// # Errors
    ///
    /// Returns `MailtagError::Serialization` if encoding fails.
    pub fn to_toml(&self) -> Result<String> {
        let snapshot = Snapshot {
            tags: self.tags.clone(),
            filters: self.filters.clone(),
        };
        toml::to_string_pretty(&snapshot).map_err(|e| MailtagError::Serialization(e.to_string()))
    }

    /// Restore tags and filters from TOML
    ///
    /// # Errors
    ///
    /// Returns `MailtagError::Serialization` if the text is not a valid snapshot.
    pub fn from_toml(text: &str, config: EngineConfig) -> Result<Self> {
        let snapshot: Snapshot =
            toml::from_str(text).map_err(|e| MailtagError::Serialization(e.to_string()))?;
        Ok(Self {
            tags: snapshot.tags,
            filters: snapshot.filters,
            config,
        })
    }
}
