//! Filter data structures
//!
//! - `FilterPosition`: base-36 position key giving evaluation order
//! - `FilterType`: which pipeline stage may run the filter
//! - `TagAction` / `TagActions`: the `+tid` / `-tid` actions a filter applies
//! - `FilterRecord`: terms, actions, comment and type of one filter
//! - `TypeSelection`: which filter types a listing wants

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::error::FilterError;
use crate::base36;
use crate::tags::TagId;

/// Position of the first filter in an empty list
pub const FIRST_POSITION: u64 = 1;

/// Dense ordinal of a filter, written in lowercase base 36
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FilterPosition(u64);

impl FilterPosition {
    #[must_use]
    pub const fn new(ordinal: u64) -> Self {
        Self(ordinal)
    }

    #[must_use]
    pub const fn ordinal(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for FilterPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base36::encode(self.0))
    }
}

impl FromStr for FilterPosition {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        base36::decode(s.trim())
            .map(Self)
            .ok_or_else(|| FilterError::InvalidPosition(s.to_string()))
    }
}

impl TryFrom<String> for FilterPosition {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FilterPosition> for String {
    fn from(position: FilterPosition) -> Self {
        position.to_string()
    }
}

/// Pipeline stage a filter belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Created by the user; the default
    #[default]
    User,
    /// Applied to newly delivered mail only
    Incoming,
    /// Internal to the mail client
    System,
    /// Created by a plugin
    Plugin,
}

impl FilterType {
    pub const ALL: &'static [Self] = &[Self::User, Self::Incoming, Self::System, Self::Plugin];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Incoming => "incoming",
            Self::System => "system",
            Self::Plugin => "plugin",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| FilterError::InvalidType(s.to_string()))
    }
}

/// One tag action of a filter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagAction {
    /// `+tid`: apply the tag
    Add(TagId),
    /// `-tid`: remove the tag
    Remove(TagId),
}

impl TagAction {
    #[must_use]
    pub const fn tid(&self) -> &TagId {
        match self {
            Self::Add(tid) | Self::Remove(tid) => tid,
        }
    }

    #[must_use]
    pub const fn sign(&self) -> char {
        match self {
            Self::Add(_) => '+',
            Self::Remove(_) => '-',
        }
    }
}

impl fmt::Display for TagAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sign(), self.tid())
    }
}

impl FromStr for TagAction {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let sign = chars.next();
        let rest = chars.as_str();
        if rest.is_empty() {
            return Err(FilterError::InvalidAction(s.to_string()));
        }
        match sign {
            Some('+') => Ok(Self::Add(TagId::new(rest))),
            Some('-') => Ok(Self::Remove(TagId::new(rest))),
            _ => Err(FilterError::InvalidAction(s.to_string())),
        }
    }
}

/// Ordered tag actions, stored as a space-separated string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagActions(Vec<TagAction>);

impl TagActions {
    #[must_use]
    pub const fn new(actions: Vec<TagAction>) -> Self {
        Self(actions)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TagAction> {
        self.0.iter()
    }

    /// Whether any action names `tid`
    #[must_use]
    pub fn mentions(&self, tid: &TagId) -> bool {
        self.0.iter().any(|action| action.tid() == tid)
    }
}

impl<'a> IntoIterator for &'a TagActions {
    type Item = &'a TagAction;
    type IntoIter = std::slice::Iter<'a, TagAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<TagAction> for TagActions {
    fn from_iter<T: IntoIterator<Item = TagAction>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for TagActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, action) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{action}")?;
        }
        Ok(())
    }
}

impl FromStr for TagActions {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace().map(str::parse::<TagAction>).collect()
    }
}

impl TryFrom<String> for TagActions {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TagActions> for String {
    fn from(actions: TagActions) -> Self {
        actions.to_string()
    }
}

/// An auto-tagging rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRecord {
    /// Opaque search terms; empty means "always match" for some stages
    #[serde(default)]
    pub terms: String,

    #[serde(default)]
    pub tags: TagActions,

    #[serde(default)]
    pub comment: String,

    #[serde(rename = "type", default)]
    pub filter_type: FilterType,
}

impl FilterRecord {
    #[must_use]
    pub fn new(terms: impl Into<String>, tags: TagActions, comment: impl Into<String>) -> Self {
        Self {
            terms: terms.into(),
            tags,
            comment: comment.into(),
            filter_type: FilterType::default(),
        }
    }

    #[must_use]
    pub const fn with_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = filter_type;
        self
    }
}

/// Filter types a listing accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSelection {
    /// Only these types
    Only(BTreeSet<FilterType>),
    /// Every type (`any` / `all`)
    Any,
}

impl TypeSelection {
    #[must_use]
    pub fn only(types: impl IntoIterator<Item = FilterType>) -> Self {
        Self::Only(types.into_iter().collect())
    }

    #[must_use]
    pub fn matches(&self, filter_type: FilterType) -> bool {
        match self {
            Self::Only(types) => types.contains(&filter_type),
            Self::Any => true,
        }
    }

    /// Parse type names; `any` or `all` anywhere selects every type
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidType` for an unknown type name.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, FilterError> {
        let mut types = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            if name.eq_ignore_ascii_case("any") || name.eq_ignore_ascii_case("all") {
                return Ok(Self::Any);
            }
            types.insert(name.parse()?);
        }
        Ok(Self::Only(types))
    }
}

impl Default for TypeSelection {
    fn default() -> Self {
        Self::only([FilterType::User])
    }
}
