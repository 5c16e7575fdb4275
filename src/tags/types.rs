//! Tag data structures
//!
//! - `TagId`: opaque, stable tag identifier
//! - `TagType` / `DisplayContext`: the closed enumerations of the tag schema
//! - `TagRecord`: a complete tag with identity, behavior and display attributes
//! - `TagSpec`: creation request for a single tag

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::TagError;
use crate::base36;

/// Wildcard attribute value matching every tag that has the attribute
pub const WILDCARD: &str = "*";

/// Names of the schema attributes every tag carries
pub const ATTRIBUTES: &[&str] = &[
    "tid",
    "name",
    "slug",
    "type",
    "flag_hides",
    "flag_editable",
    "template",
    "search_terms",
    "search_order",
    "magic_terms",
    "icon",
    "label",
    "label_color",
    "display",
    "display_order",
    "parent",
];

/// Opaque tag identifier, immutable once assigned
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id for the n-th allocated tag
    #[must_use]
    pub fn from_ordinal(ordinal: u64) -> Self {
        Self(base36::encode(ordinal))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! schema_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal, default = $default:ident,
        { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $(
                #[doc = $text]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TagError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|member| member.as_str() == wanted)
                    .ok_or_else(|| TagError::InvalidValue {
                        field: $field.to_string(),
                        value: s.to_string(),
                    })
            }
        }
    };
}

schema_enum! {
    /// Functional type of a tag
    TagType, "type", default = Tag, {
        Tag => "tag",
        Group => "group",
        Attribute => "attribute",
        Unread => "unread",
        Drafts => "drafts",
        Blank => "blank",
        Outbox => "outbox",
        Sent => "sent",
        Replied => "replied",
        Fwded => "fwded",
        Tagged => "tagged",
        Read => "read",
        Ham => "ham",
        Trash => "trash",
        Spam => "spam",
    }
}

schema_enum! {
    /// UI placement of a tag
    DisplayContext, "display", default = Tag, {
        Priority => "priority",
        Tag => "tag",
        Subtag => "subtag",
        Archive => "archive",
        Invisible => "invisible",
    }
}

fn default_template() -> String {
    "index".to_string()
}

fn default_search_terms() -> String {
    "in:%(slug)s".to_string()
}

fn default_icon() -> String {
    "icon-tag".to_string()
}

fn default_label_color() -> String {
    "#4D4D4D".to_string()
}

const fn default_true() -> bool {
    true
}

/// A tag and all of its attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub tid: TagId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub slug: String,

    #[serde(rename = "type", default)]
    pub tag_type: TagType,

    /// Messages under this tag are left out of default searches
    #[serde(default)]
    pub flag_hides: bool,

    #[serde(default)]
    pub flag_editable: bool,

    #[serde(default = "default_template")]
    pub template: String,

    #[serde(default = "default_search_terms")]
    pub search_terms: String,

    #[serde(default)]
    pub search_order: String,

    #[serde(default)]
    pub magic_terms: String,

    #[serde(default = "default_icon")]
    pub icon: String,

    #[serde(default = "default_true")]
    pub label: bool,

    #[serde(default = "default_label_color")]
    pub label_color: String,

    #[serde(default)]
    pub display: DisplayContext,

    /// Sort key within lists; rewritten wholesale by the store
    #[serde(default)]
    pub display_order: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TagId>,

    /// Attributes outside the schema, e.g. contributed by plugins
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl TagRecord {
    /// Create a tag with schema defaults
    #[must_use]
    pub fn new(tid: TagId, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            tid,
            name: name.into(),
            slug: slug.into(),
            tag_type: TagType::default(),
            flag_hides: false,
            flag_editable: false,
            template: default_template(),
            search_terms: default_search_terms(),
            search_order: String::new(),
            magic_terms: String::new(),
            icon: default_icon(),
            label: true,
            label_color: default_label_color(),
            display: DisplayContext::default(),
            display_order: 0.0,
            parent: None,
            extra: BTreeMap::new(),
        }
    }

    /// String form of an attribute, as compared by tag queries
    ///
    /// Schema attributes always exist (an unset `parent` reads as `""`);
    /// extension attributes exist only when set.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<String> {
        let value = match key {
            "tid" => self.tid.to_string(),
            "name" => self.name.clone(),
            "slug" => self.slug.clone(),
            "type" => self.tag_type.to_string(),
            "flag_hides" => self.flag_hides.to_string(),
            "flag_editable" => self.flag_editable.to_string(),
            "template" => self.template.clone(),
            "search_terms" => self.search_terms.clone(),
            "search_order" => self.search_order.clone(),
            "magic_terms" => self.magic_terms.clone(),
            "icon" => self.icon.clone(),
            "label" => self.label.to_string(),
            "label_color" => self.label_color.clone(),
            "display" => self.display.to_string(),
            "display_order" => format_float(self.display_order),
            "parent" => self.parent.as_ref().map(ToString::to_string).unwrap_or_default(),
            other => return self.extra.get(other).cloned(),
        };
        Some(value)
    }

    /// Set an attribute from its string form, coercing to the field type
    ///
    /// Unknown keys are stored in `extra`. Slug uniqueness is the store's
    /// concern; only the slug form is checked here.
    ///
    /// # Errors
    ///
    /// Returns `TagError::InvalidValue` for values that do not fit the field,
    /// `TagError::InvalidSlug` for a malformed slug.
    pub fn set_attribute(&mut self, key: &str, value: &str) -> Result<(), TagError> {
        match key {
            "tid" => return Err(invalid("tid", value)),
            "name" => self.name = value.to_string(),
            "slug" => {
                super::slug::validate_slug(value)?;
                self.slug = value.to_string();
            }
            "type" => self.tag_type = value.parse()?,
            "flag_hides" => self.flag_hides = parse_bool(key, value)?,
            "flag_editable" => self.flag_editable = parse_bool(key, value)?,
            "template" => self.template = value.to_string(),
            "search_terms" => self.search_terms = value.to_string(),
            "search_order" => self.search_order = value.to_string(),
            "magic_terms" => self.magic_terms = value.to_string(),
            "icon" => self.icon = value.to_string(),
            "label" => self.label = parse_bool(key, value)?,
            "label_color" => self.label_color = value.to_string(),
            "display" => self.display = value.parse()?,
            "display_order" => {
                self.display_order = value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| invalid(key, value))?;
            }
            "parent" => {
                let value = value.trim();
                self.parent = (!value.is_empty()).then(|| TagId::new(value.to_ascii_lowercase()));
            }
            other => {
                self.extra.insert(other.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    /// Search terms with the `%(slug)s` placeholder filled in
    #[must_use]
    pub fn expanded_search_terms(&self) -> String {
        self.search_terms.replace("%(slug)s", &self.slug)
    }
}

/// Request to create one tag
///
/// # Examples
/// ```
/// # use mailtag::tags::TagSpec;
/// let spec = TagSpec::new("Mailing Lists")
///     .attr("display", "priority")
///     .attr("label_color", "#ff0000");
/// assert_eq!(spec.effective_slug(), "mailing-lists");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSpec {
    pub name: String,
    /// Explicit slug; derived from the name when absent
    pub slug: Option<String>,
    /// Attribute overrides applied after schema defaults
    pub attributes: BTreeMap<String, String>,
}

impl TagSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Slug the tag will be created with
    #[must_use]
    pub fn effective_slug(&self) -> String {
        self.slug
            .clone()
            .unwrap_or_else(|| super::slug::slugify(&self.name))
    }
}

fn invalid(field: &str, value: &str) -> TagError {
    TagError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, TagError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(invalid(field, value)),
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
