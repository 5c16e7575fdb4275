//! Filter list operations
//!
//! This module provides a `FilterList` holding filters by position, with
//! append, replace, remove, move and listing operations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use super::error::FilterError;
use super::types::{
    FIRST_POSITION, FilterPosition, FilterRecord, FilterType, TagActions, TypeSelection,
};
use crate::tags::{TagId, TagStore};

/// Outcome of a best-effort filter removal batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoveReport {
    pub removed: Vec<FilterPosition>,
    pub failures: Vec<FilterError>,
}

/// One row of a human-facing filter listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterListing {
    pub fid: FilterPosition,
    pub terms: String,
    pub tags: String,
    /// Tag actions with slugs instead of ids, `(None)` for unknown tags
    pub human_tags: String,
    pub comment: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
}

impl fmt::Display for FilterListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fid = self.fid.to_string();
        let fid: String = fid.chars().take(3).collect();
        write!(
            f,
            "{fid:>3} {:<10} {:<18} {:<18} {}",
            self.filter_type, self.terms, self.human_tags, self.comment
        )
    }
}

/// Filters keyed by position
///
/// Positions form a dense run starting at [`FIRST_POSITION`]. Removing a
/// filter clears its slot but keeps the position, so later filters keep
/// their keys. A cleared slot is distinct from any stored record, even one
/// whose fields are all empty.
///
/// # Examples
///
/// ```
/// use mailtag::filters::{FilterList, FilterRecord};
///
/// let mut list = FilterList::new();
/// let first = list.append(FilterRecord::new("from:boss", "+1".parse().unwrap(), "Boss"));
/// let second = list.append(FilterRecord::new("list:rust", "+2".parse().unwrap(), "Rust"));
/// assert_eq!(first.to_string(), "1");
/// assert_eq!(second.to_string(), "2");
///
/// list.move_filter(second, first);
/// assert_eq!(list.get(first).unwrap().terms, "list:rust");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterList {
    /// `None` marks a removed filter
    filters: BTreeMap<FilterPosition, Option<FilterRecord>>,
}

/// On-disk form of a slot
///
/// A stored record writes every field; a cleared slot is an empty table.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredSlot {
    #[serde(skip_serializing_if = "Option::is_none")]
    terms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<TagActions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    filter_type: Option<FilterType>,
}

impl From<Option<&FilterRecord>> for StoredSlot {
    fn from(slot: Option<&FilterRecord>) -> Self {
        slot.map_or_else(Self::default, |record| Self {
            terms: Some(record.terms.clone()),
            tags: Some(record.tags.clone()),
            comment: Some(record.comment.clone()),
            filter_type: Some(record.filter_type),
        })
    }
}

impl From<StoredSlot> for Option<FilterRecord> {
    fn from(slot: StoredSlot) -> Self {
        if slot.terms.is_none()
            && slot.tags.is_none()
            && slot.comment.is_none()
            && slot.filter_type.is_none()
        {
            return None;
        }
        Some(FilterRecord {
            terms: slot.terms.unwrap_or_default(),
            tags: slot.tags.unwrap_or_default(),
            comment: slot.comment.unwrap_or_default(),
            filter_type: slot.filter_type.unwrap_or_default(),
        })
    }
}

impl Serialize for FilterList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.filters
                .iter()
                .map(|(position, slot)| (position, StoredSlot::from(slot.as_ref()))),
        )
    }
}

impl<'de> Deserialize<'de> for FilterList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = BTreeMap::<FilterPosition, StoredSlot>::deserialize(deserializer)?;
        Ok(Self {
            filters: stored
                .into_iter()
                .map(|(position, slot)| (position, slot.into()))
                .collect(),
        })
    }
}

impl FilterList {
    /// Create an empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of positions in use, cleared ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The live filter at `position`
    #[must_use]
    pub fn get(&self, position: FilterPosition) -> Option<&FilterRecord> {
        self.filters.get(&position).and_then(Option::as_ref)
    }

    /// Whether `position` holds a removed filter
    #[must_use]
    pub fn is_cleared(&self, position: FilterPosition) -> bool {
        matches!(self.filters.get(&position), Some(None))
    }

    fn live(&self) -> impl Iterator<Item = (FilterPosition, &FilterRecord)> {
        self.filters
            .iter()
            .filter_map(|(position, slot)| slot.as_ref().map(|record| (*position, record)))
    }

    /// Position the next appended filter will get
    #[must_use]
    pub fn next_position(&self) -> FilterPosition {
        self.filters
            .keys()
            .next_back()
            .map_or(FilterPosition::new(FIRST_POSITION), |last| last.next())
    }

    /// Store a filter at the next free position
    pub fn append(&mut self, record: FilterRecord) -> FilterPosition {
        let position = self.next_position();
        info!(fid = %position, terms = %record.terms, "added filter");
        self.filters.insert(position, Some(record));
        position
    }

    /// Store a filter at `position`, creating the position if needed
    ///
    /// Returns the live record previously held there.
    pub fn replace(&mut self, position: FilterPosition, record: FilterRecord) -> Option<FilterRecord> {
        info!(fid = %position, terms = %record.terms, "set filter");
        self.filters.insert(position, Some(record)).flatten()
    }

    /// Overwrite the filter at an existing position
    ///
    /// # Errors
    ///
    /// Returns `FilterError::NotFound` if no live filter is stored there.
    pub fn replace_existing(
        &mut self,
        position: FilterPosition,
        record: FilterRecord,
    ) -> Result<FilterRecord, FilterError> {
        match self.filters.get_mut(&position) {
            Some(Some(slot)) => Ok(std::mem::replace(slot, record)),
            _ => Err(FilterError::NotFound(position.to_string())),
        }
    }

    /// Clear the filters at `positions`, leaving the positions in place
    pub fn remove(&mut self, positions: &[FilterPosition]) -> RemoveReport {
        let mut report = RemoveReport::default();
        for &position in positions {
            match self.filters.get_mut(&position) {
                Some(slot @ Some(_)) => {
                    *slot = None;
                    info!(fid = %position, "removed filter");
                    report.removed.push(position);
                }
                _ => report.failures.push(FilterError::NotFound(position.to_string())),
            }
        }
        report
    }

    /// Remove filters named by position or by their exact search terms
    ///
    /// A token naming a live position removes that filter; otherwise every
    /// filter whose terms equal the token is removed.
    pub fn remove_matching<S: AsRef<str>>(&mut self, tokens: &[S]) -> RemoveReport {
        let mut positions = Vec::new();
        let mut failures = Vec::new();

        for token in tokens {
            let token = token.as_ref();
            let live = token
                .parse::<FilterPosition>()
                .ok()
                .filter(|position| self.get(*position).is_some());
            if let Some(position) = live {
                positions.push(position);
                continue;
            }

            let by_terms: Vec<FilterPosition> = self
                .live()
                .filter(|(_, record)| record.terms == token)
                .map(|(position, _)| position)
                .collect();
            if by_terms.is_empty() {
                failures.push(FilterError::NotFound(token.to_string()));
            }
            positions.extend(by_terms);
        }

        positions.sort();
        positions.dedup();
        let mut report = self.remove(&positions);
        report.failures.extend(failures);
        report
    }

    fn swap(&mut self, a: FilterPosition, b: FilterPosition) {
        let first = self.filters.remove(&a);
        let second = self.filters.remove(&b);
        if let Some(record) = second {
            self.filters.insert(a, record);
        }
        if let Some(record) = first {
            self.filters.insert(b, record);
        }
    }

    /// Move the filter at `from` to `to`, shifting the filters in between
    ///
    /// Implemented as adjacent swaps, so the filters between the two
    /// positions each move one step toward `from`. Missing positions are
    /// swapped as empty placeholders.
    pub fn move_filter(&mut self, from: FilterPosition, to: FilterPosition) {
        let (f, t) = (from.ordinal(), to.ordinal());
        let live_before = self.live().count();
        if f > t {
            for ordinal in (t..f).rev() {
                self.swap(FilterPosition::new(ordinal + 1), FilterPosition::new(ordinal));
            }
        } else if f < t {
            for ordinal in f..t {
                self.swap(FilterPosition::new(ordinal), FilterPosition::new(ordinal + 1));
            }
        }
        debug_assert_eq!(self.live().count(), live_before, "move lost or duplicated a filter");
        debug!(from = %from, to = %to, "moved filter");
    }

    /// Live filters of the selected types, in position order
    ///
    /// With `filter_on`, only filters whose terms equal it exactly.
    #[must_use]
    pub fn list(
        &self,
        filter_on: Option<&str>,
        types: &TypeSelection,
    ) -> Vec<(FilterPosition, &FilterRecord)> {
        self.live()
            .filter(|(_, record)| types.matches(record.filter_type))
            .filter(|(_, record)| filter_on.is_none_or(|terms| record.terms == terms))
            .collect()
    }

    /// Positions of live filters with an action on `tid`
    #[must_use]
    pub fn referencing(&self, tid: &TagId) -> Vec<FilterPosition> {
        self.live()
            .filter(|(_, record)| record.tags.mentions(tid))
            .map(|(position, _)| position)
            .collect()
    }

    /// Human-facing listing of every filter
    ///
    /// Query terms must all hold: `=<pos>` matches the position, `@<type>`
    /// the filter type, anything else must appear (case-insensitively) in the
    /// human-readable tags, the terms or the comment.
    #[must_use]
    pub fn search<S: AsRef<str>>(&self, query: &[S], tags: &TagStore) -> Vec<FilterListing> {
        let terms: Vec<String> = query.iter().map(|t| t.as_ref().to_lowercase()).collect();

        self.list(None, &TypeSelection::Any)
            .into_iter()
            .map(|(position, record)| describe(position, record, tags))
            .filter(|listing| {
                let human_tags = listing.human_tags.to_lowercase();
                let search_terms = listing.terms.to_lowercase();
                let comment = listing.comment.to_lowercase();
                terms.iter().all(|term| {
                    if let Some(fid) = term.strip_prefix('=') {
                        fid == listing.fid.to_string()
                    } else if let Some(kind) = term.strip_prefix('@') {
                        kind == listing.filter_type.as_str()
                    } else {
                        human_tags.contains(term.as_str())
                            || search_terms.contains(term.as_str())
                            || comment.contains(term.as_str())
                    }
                })
            })
            .collect()
    }

    /// Listing entry for one position, if a live filter is stored there
    #[must_use]
    pub fn describe(&self, position: FilterPosition, tags: &TagStore) -> Option<FilterListing> {
        self.get(position)
            .map(|record| describe(position, record, tags))
    }
}

fn describe(position: FilterPosition, record: &FilterRecord, tags: &TagStore) -> FilterListing {
    let human_tags: Vec<String> = record
        .tags
        .iter()
        .map(|action| {
            let slug = tags
                .get(action.tid())
                .map_or("(None)", |tag| tag.slug.as_str());
            format!("{}{slug}", action.sign())
        })
        .collect();

    FilterListing {
        fid: position,
        terms: record.terms.clone(),
        tags: record.tags.to_string(),
        human_tags: human_tags.join(" "),
        comment: record.comment.clone(),
        filter_type: record.filter_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagSpec;

    fn record(terms: &str) -> FilterRecord {
        FilterRecord::new(terms, "+1".parse().unwrap(), format!("Filter for {terms}"))
    }

    fn list_of(terms: &[&str]) -> FilterList {
        let mut list = FilterList::new();
        for t in terms {
            list.append(record(t));
        }
        list
    }

    fn pos(text: &str) -> FilterPosition {
        text.parse().unwrap()
    }

    fn terms_in_order(list: &FilterList) -> Vec<String> {
        list.list(None, &TypeSelection::Any)
            .into_iter()
            .map(|(_, record)| record.terms.clone())
            .collect()
    }

    #[test]
    fn test_append_is_dense_from_one() {
        let mut list = FilterList::new();
        assert_eq!(list.append(record("a")), pos("1"));
        assert_eq!(list.append(record("b")), pos("2"));
        assert_eq!(list.next_position(), pos("3"));
    }

    #[test]
    fn test_append_crosses_into_letters() {
        let mut list = FilterList::new();
        for i in 0..10 {
            list.append(record(&i.to_string()));
        }
        assert_eq!(list.append(record("eleven")), pos("b"));
    }

    #[test]
    fn test_replace_or_create() {
        let mut list = list_of(&["a"]);
        let previous = list.replace(pos("1"), record("x"));
        assert_eq!(previous.unwrap().terms, "a");
        assert!(list.replace(pos("5"), record("y")).is_none());
        assert_eq!(list.next_position(), pos("6"));
    }

    #[test]
    fn test_replace_existing_is_strict() {
        let mut list = list_of(&["a"]);
        assert!(list.replace_existing(pos("1"), record("b")).is_ok());
        assert!(matches!(
            list.replace_existing(pos("2"), record("c")),
            Err(FilterError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_leaves_gap() {
        let mut list = list_of(&["a", "b", "c"]);
        let report = list.remove(&[pos("2"), pos("9")]);

        assert_eq!(report.removed, vec![pos("2")]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(list.len(), 3);
        assert!(list.get(pos("2")).is_none());
        assert!(list.is_cleared(pos("2")));
        assert_eq!(terms_in_order(&list), vec!["a", "c"]);
        assert_eq!(list.next_position(), pos("4"));
    }

    #[test]
    fn test_remove_twice_reports_not_found() {
        let mut list = list_of(&["a"]);
        list.remove(&[pos("1")]);
        let report = list.remove(&[pos("1")]);
        assert!(report.removed.is_empty());
        assert_eq!(report.failures, vec![FilterError::NotFound("1".to_string())]);
    }

    #[test]
    fn test_remove_matching_by_terms() {
        let mut list = list_of(&["from:boss", "list:rust", "from:boss"]);
        let report = list.remove_matching(&["from:boss", "nothing-like-this"]);

        assert_eq!(report.removed, vec![pos("1"), pos("3")]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(terms_in_order(&list), vec!["list:rust"]);
    }

    #[test]
    fn test_move_down() {
        let mut list = list_of(&["a", "b", "c"]);
        list.move_filter(pos("1"), pos("3"));
        assert_eq!(terms_in_order(&list), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_move_up() {
        let mut list = list_of(&["a", "b", "c", "d"]);
        list.move_filter(pos("4"), pos("2"));
        assert_eq!(terms_in_order(&list), vec!["a", "d", "b", "c"]);
    }

    #[test]
    fn test_move_same_position_is_noop() {
        let mut list = list_of(&["a", "b"]);
        let before = list.clone();
        list.move_filter(pos("2"), pos("2"));
        assert_eq!(list, before);
    }

    #[test]
    fn test_move_then_back_restores() {
        let original = list_of(&["a", "b", "c", "d", "e"]);
        for f in 1..=5 {
            for t in 1..=5 {
                let mut list = original.clone();
                list.move_filter(FilterPosition::new(f), FilterPosition::new(t));
                list.move_filter(FilterPosition::new(t), FilterPosition::new(f));
                assert_eq!(list, original, "move {f} -> {t} -> {f}");
            }
        }
    }

    #[test]
    fn test_move_through_missing_position() {
        let mut list = list_of(&["a"]);
        list.move_filter(pos("1"), pos("3"));
        assert!(list.get(pos("1")).is_none());
        assert_eq!(list.get(pos("3")).unwrap().terms, "a");
    }

    #[test]
    fn test_move_carries_cleared_slots() {
        let mut list = list_of(&["a", "b", "c"]);
        list.remove(&[pos("1")]);
        list.move_filter(pos("1"), pos("3"));

        assert!(list.is_cleared(pos("3")));
        assert_eq!(terms_in_order(&list), vec!["b", "c"]);
        assert_eq!(list.get(pos("1")).unwrap().terms, "b");
    }

    #[test]
    fn test_empty_record_is_not_a_removed_slot() {
        let mut list = list_of(&["a"]);
        let blank = FilterRecord::new("", TagActions::default(), "").with_type(FilterType::System);
        list.replace(pos("2"), blank.clone());

        assert!(!list.is_cleared(pos("2")));
        let listed = list.list(None, &TypeSelection::Any);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1], (pos("2"), &blank));
        assert!(list.replace_existing(pos("2"), record("b")).is_ok());
    }

    #[test]
    fn test_snapshot_keeps_cleared_and_blank_slots_apart() {
        let mut list = list_of(&["a", "b"]);
        list.remove(&[pos("1")]);
        list.replace(pos("3"), FilterRecord::new("", TagActions::default(), ""));

        let text = toml::to_string(&list).unwrap();
        let back: FilterList = toml::from_str(&text).unwrap();

        assert_eq!(back, list);
        assert!(back.is_cleared(pos("1")));
        assert!(back.get(pos("3")).is_some());
        assert_eq!(back.next_position(), pos("4"));
    }

    #[test]
    fn test_list_by_type_and_terms() {
        let mut list = FilterList::new();
        list.append(record("a"));
        list.append(record("b").with_type(FilterType::Incoming));
        list.append(record("a").with_type(FilterType::System));

        let user = list.list(None, &TypeSelection::default());
        assert_eq!(user.len(), 1);
        assert_eq!(user[0].0, pos("1"));

        let any_a = list.list(Some("a"), &TypeSelection::Any);
        let positions: Vec<_> = any_a.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![pos("1"), pos("3")]);
    }

    #[test]
    fn test_search_and_human_tags() {
        let mut tags = TagStore::new();
        let created = tags
            .create_tags(vec![TagSpec::new("Work"), TagSpec::new("Inbox")])
            .unwrap();
        let work = &created[0].tid;
        let inbox = &created[1].tid;

        let mut list = FilterList::new();
        list.append(FilterRecord::new(
            "from:boss",
            format!("+{work} -{inbox} +zz").parse().unwrap(),
            "Boss mail",
        ));
        list.append(FilterRecord::new("list:rust", format!("+{work}").parse().unwrap(), "Rust").with_type(FilterType::Plugin));

        let all = list.search::<&str>(&[], &tags);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].human_tags, "+work -inbox +(None)");

        assert_eq!(list.search(&["BOSS"], &tags).len(), 1);
        assert_eq!(list.search(&["inbox"], &tags).len(), 1);
        assert_eq!(list.search(&["@plugin"], &tags)[0].fid, pos("2"));
        assert_eq!(list.search(&["=2", "rust"], &tags).len(), 1);
        assert!(list.search(&["=1", "rust"], &tags).is_empty());
    }

    #[test]
    fn test_referencing() {
        let mut list = FilterList::new();
        list.append(FilterRecord::new("x", "+a -b".parse().unwrap(), ""));
        list.append(FilterRecord::new("y", "+c".parse().unwrap(), ""));
        assert_eq!(list.referencing(&TagId::new("b")), vec![pos("1")]);
        assert!(list.referencing(&TagId::new("d")).is_empty());
    }

    #[test]
    fn test_listing_row_format() {
        let tags = TagStore::new();
        let mut list = FilterList::new();
        list.append(FilterRecord::new("from:boss", "+q".parse().unwrap(), "Boss"));
        let row = list.describe(pos("1"), &tags).unwrap().to_string();
        let expected = format!("  1 {:<10} {:<18} {:<18} Boss", "user", "from:boss", "+(None)");
        assert_eq!(row, expected);
    }
}
