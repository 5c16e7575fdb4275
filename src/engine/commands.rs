//! Batch commands on a [`Registry`]
//!
//! Each command reports what it did in an outcome value. Per-item failures
//! (an unknown tag, an index that refused a change) are collected in the
//! outcome and logged; they never abort the rest of the batch. Outcomes
//! render as short human-readable summaries through `Display`.

use std::fmt;
use tracing::{info, warn};

use super::Registry;
use crate::filters::{
    FilterError, FilterListing, FilterPosition, FilterRecord, FilterType, TagAction,
};
use crate::index::{MessageId, MessageIndex};
use crate::query::{self, TagQuery};
use crate::tags::{TagError, TagId, TagRecord, TagSpec};

const NOTHING_HAPPENED: &str = "Nothing happened";

fn names(tags: &[TagRecord]) -> String {
    tags.iter()
        .map(|tag| tag.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Split `+token` / `-token` into its sign and token
fn split_op(op: &str) -> Option<(char, &str)> {
    let sign = op.chars().next().filter(|c| *c == '+' || *c == '-')?;
    let token = &op[1..];
    (!token.is_empty()).then_some((sign, token))
}

/// Tags created by [`Registry::add_tags`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddTagsOutcome {
    pub added: Vec<TagRecord>,
}

impl fmt::Display for AddTagsOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.added.is_empty() {
            return f.write_str(NOTHING_HAPPENED);
        }
        write!(f, "Added tags: {}", names(&self.added))
    }
}

/// Result of [`Registry::delete_tags`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteTagsOutcome {
    pub removed: Vec<TagRecord>,
    pub failures: Vec<(String, TagError)>,
    /// Filters still acting on a removed tag
    pub orphaned_filters: Vec<FilterPosition>,
}

impl fmt::Display for DeleteTagsOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.removed.is_empty() {
            return f.write_str(NOTHING_HAPPENED);
        }
        write!(f, "Removed tags: {}", names(&self.removed))
    }
}

/// Result of [`Registry::tag_messages`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagMessagesOutcome {
    pub msg_ids: Vec<MessageId>,
    pub tagged: Vec<TagRecord>,
    pub untagged: Vec<TagRecord>,
    /// `tagged`-type tags added for behavior tracking
    pub tracked: Vec<TagId>,
    /// Ops that could not be applied
    pub failures: Vec<(String, TagError)>,
}

impl TagMessagesOutcome {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.msg_ids.is_empty() || (self.tagged.is_empty() && self.untagged.is_empty())
    }
}

impl fmt::Display for TagMessagesOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            return f.write_str(NOTHING_HAPPENED);
        }
        let mut what = Vec::new();
        if !self.tagged.is_empty() {
            what.push(format!("Tagged {}", names(&self.tagged)));
        }
        if !self.untagged.is_empty() {
            what.push(format!("Untagged {}", names(&self.untagged)));
        }
        write!(f, "{} ({} messages)", what.join(", "), self.msg_ids.len())
    }
}

/// A new filter, as given by the user
///
/// Ops are `+tag` / `-tag` with the tag named by id, slug or name. An
/// explicit position replaces (or creates) the filter there instead of
/// appending. With `auto_tag` messages, the ops are also applied to those
/// messages right away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRequest {
    pub terms: String,
    pub ops: Vec<String>,
    /// Defaults to `Filter for <ops>`
    pub comment: Option<String>,
    pub filter_type: FilterType,
    pub position: Option<FilterPosition>,
    pub auto_tag: Vec<MessageId>,
}

impl FilterRequest {
    pub fn new<S: Into<String>>(terms: impl Into<String>, ops: impl IntoIterator<Item = S>) -> Self {
        Self {
            terms: terms.into(),
            ops: ops.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Filter matching all new mail
    pub fn for_new_mail<S: Into<String>>(ops: impl IntoIterator<Item = S>) -> Self {
        Self::new("*", ops)
    }

    /// Filter run when mail is read
    pub fn for_read<S: Into<String>>(ops: impl IntoIterator<Item = S>) -> Self {
        Self::new("@read", ops)
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub const fn filter_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = filter_type;
        self
    }

    #[must_use]
    pub const fn at(mut self, position: FilterPosition) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn auto_tag(mut self, msg_ids: Vec<MessageId>) -> Self {
        self.auto_tag = msg_ids;
        self
    }
}

/// Result of [`Registry::add_filter`]
#[derive(Debug, Clone, PartialEq)]
pub struct AddFilterOutcome {
    pub position: FilterPosition,
    pub record: FilterRecord,
    /// Filter previously stored at an explicit position
    pub replaced: Option<FilterRecord>,
    /// Messages tagged right away
    pub tagged: Option<TagMessagesOutcome>,
}

impl fmt::Display for AddFilterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.replaced.is_some() { "Replaced" } else { "Added" };
        write!(
            f,
            "{verb} filter {}: {} {}",
            self.position, self.record.terms, self.record.tags
        )?;
        if let Some(tagged) = &self.tagged {
            write!(f, "; {tagged}")?;
        }
        Ok(())
    }
}

/// Result of [`Registry::delete_filters`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteFiltersOutcome {
    pub removed: Vec<FilterPosition>,
    pub failures: Vec<FilterError>,
}

impl fmt::Display for DeleteFiltersOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.removed.is_empty() {
            return f.write_str(NOTHING_HAPPENED);
        }
        let positions: Vec<String> = self.removed.iter().map(ToString::to_string).collect();
        write!(f, "Removed filters: {}", positions.join(", "))
    }
}

/// Filter listing rows, one per line when displayed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterTable(pub Vec<FilterListing>);

impl fmt::Display for FilterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{row}")?;
        }
        Ok(())
    }
}

impl Registry {
    /// Create tags; all-or-nothing
    ///
    /// # Errors
    ///
    /// Returns the first validation error of the batch; nothing is created then.
    pub fn add_tags(&mut self, specs: Vec<TagSpec>) -> Result<AddTagsOutcome, TagError> {
        let added = self.tags.create_tags(specs)?;
        Ok(AddTagsOutcome { added })
    }

    /// Delete tags by token, untagging their messages first
    ///
    /// Filters acting on a removed tag are kept; their positions are
    /// reported so the caller can fix or drop them.
    pub fn delete_tags<I, S>(&mut self, tokens: &[S], index: &mut I) -> DeleteTagsOutcome
    where
        I: MessageIndex + ?Sized,
        S: AsRef<str>,
    {
        let report = self.tags.delete_tags(tokens, index);

        let mut orphaned_filters = Vec::new();
        for tag in &report.removed {
            for position in self.filters.referencing(&tag.tid) {
                warn!(tid = %tag.tid, fid = %position, "filter refers to deleted tag");
                orphaned_filters.push(position);
            }
        }
        orphaned_filters.sort();
        orphaned_filters.dedup();

        DeleteTagsOutcome {
            removed: report.removed,
            failures: report.failures,
            orphaned_filters,
        }
    }

    /// Apply `+tag` / `-tag` ops to messages
    ///
    /// When fewer than `behavior_tracking_threshold` messages are touched
    /// and at least one op applied, every tag of type `tagged` is added to
    /// them as well.
    pub fn tag_messages<I, S>(&self, ops: &[S], msg_ids: &[MessageId], index: &mut I) -> TagMessagesOutcome
    where
        I: MessageIndex + ?Sized,
        S: AsRef<str>,
    {
        let mut outcome = TagMessagesOutcome {
            msg_ids: msg_ids.to_vec(),
            ..TagMessagesOutcome::default()
        };

        for op in ops {
            let op = op.as_ref();
            let Some((sign, token)) = split_op(op) else {
                warn!(op, "tag op needs a + or - prefix");
                outcome.failures.push((
                    op.to_string(),
                    TagError::InvalidValue {
                        field: "op".to_string(),
                        value: op.to_string(),
                    },
                ));
                continue;
            };
            let Some(tag) = self.get_tag(token) else {
                warn!(op, "unknown tag");
                outcome
                    .failures
                    .push((op.to_string(), TagError::NotFound(token.to_string())));
                continue;
            };

            let result = if sign == '-' {
                index.remove_tag_from_messages(&tag.tid, msg_ids)
            } else {
                index.add_tag_to_messages(&tag.tid, msg_ids)
            };
            match result {
                Ok(()) if sign == '-' => outcome.untagged.push(tag.clone()),
                Ok(()) => outcome.tagged.push(tag.clone()),
                Err(source) => {
                    warn!(op, error = %source, "index refused tag op");
                    outcome.failures.push((
                        op.to_string(),
                        TagError::DependencyFailure {
                            tid: tag.tid.clone(),
                            source,
                        },
                    ));
                }
            }
        }

        let applied = !outcome.tagged.is_empty() || !outcome.untagged.is_empty();
        if applied && msg_ids.len() < self.config.behavior_tracking_threshold {
            for tag in query::query_tags(&self.tags, &TagQuery::new().with("type", "tagged")) {
                match index.add_tag_to_messages(&tag.tid, msg_ids) {
                    Ok(()) => outcome.tracked.push(tag.tid.clone()),
                    Err(source) => warn!(tid = %tag.tid, error = %source, "behavior tracking failed"),
                }
            }
        }

        info!(
            messages = msg_ids.len(),
            tagged = outcome.tagged.len(),
            untagged = outcome.untagged.len(),
            "tagged messages"
        );
        outcome
    }

    /// Add a filter, or replace the one at the requested position
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Usage` without terms or ops,
    /// `FilterError::InvalidAction` for an op without sign, and
    /// `FilterError::Tag` unless every op names exactly one tag. With
    /// `auto_tag` messages, an index failure on any op is returned as
    /// `FilterError::Tag(TagError::DependencyFailure)`. Nothing is stored on
    /// error.
    pub fn add_filter<I>(&mut self, request: FilterRequest, index: &mut I) -> Result<AddFilterOutcome, FilterError>
    where
        I: MessageIndex + ?Sized,
    {
        if request.terms.trim().is_empty() || request.ops.is_empty() {
            return Err(FilterError::Usage(
                "Need search terms and at least one +tag or -tag".to_string(),
            ));
        }

        let mut actions = Vec::with_capacity(request.ops.len());
        for op in &request.ops {
            let (sign, token) =
                split_op(op).ok_or_else(|| FilterError::InvalidAction(op.clone()))?;
            let tid = query::resolve_single(&self.tags, token)?.tid.clone();
            actions.push(if sign == '-' {
                TagAction::Remove(tid)
            } else {
                TagAction::Add(tid)
            });
        }

        let comment = request
            .comment
            .filter(|comment| !comment.is_empty())
            .unwrap_or_else(|| format!("Filter for {}", request.ops.join(" ")));
        let record = FilterRecord::new(request.terms, actions.into_iter().collect(), comment)
            .with_type(request.filter_type);

        let tagged = if request.auto_tag.is_empty() {
            None
        } else {
            let outcome = self.tag_messages(&request.ops, &request.auto_tag, index);
            if let Some((op, failure)) = outcome
                .failures
                .iter()
                .find(|(_, failure)| matches!(failure, TagError::DependencyFailure { .. }))
            {
                warn!(op = %op, terms = %record.terms, "auto-tagging failed, filter not stored");
                return Err(FilterError::Tag(failure.clone()));
            }
            Some(outcome)
        };

        let (position, replaced) = match request.position {
            Some(position) => (position, self.filters.replace(position, record.clone())),
            None => (self.filters.append(record.clone()), None),
        };

        Ok(AddFilterOutcome {
            position,
            record,
            replaced,
            tagged,
        })
    }

    /// Delete filters by position or exact terms
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Usage` when no tokens are given.
    pub fn delete_filters<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<DeleteFiltersOutcome, FilterError> {
        if tokens.is_empty() {
            return Err(FilterError::Usage("Delete what?".to_string()));
        }

        let report = self.filters.remove_matching(tokens);
        for failure in &report.failures {
            warn!(error = %failure, "failed to remove filter");
        }
        Ok(DeleteFiltersOutcome {
            removed: report.removed,
            failures: report.failures,
        })
    }

    /// Human-facing filter listing, see [`FilterList::search`](crate::filters::FilterList::search)
    #[must_use]
    pub fn list_filters<S: AsRef<str>>(&self, query: &[S]) -> FilterTable {
        FilterTable(self.filters.search(query, &self.tags))
    }

    /// Move a filter and list it at its new position
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidPosition` as [`Registry::move_filter`] does.
    pub fn move_filter_listing(
        &mut self,
        from: FilterPosition,
        to: FilterPosition,
    ) -> Result<FilterTable, FilterError> {
        self.move_filter(from, to)?;
        Ok(FilterTable(self.filters.describe(to, &self.tags).into_iter().collect()))
    }
}
