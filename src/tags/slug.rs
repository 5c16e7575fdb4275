//! Slug canonicalization and validation
//!
//! A slug is lowercase ASCII made of letters, digits, `-`, `_` and `.`.
//! Whitespace in names becomes `-`; everything else outside that set
//! (including path separators) is dropped.

use regex::Regex;
use std::sync::LazyLock;

use super::TagError;

static NOT_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9._-]+").expect("slug regex is valid"));

/// Derive the canonical slug for a tag name
///
/// # Examples
/// ```
/// # use mailtag::tags::slugify;
/// assert_eq!(slugify("Work Stuff"), "work-stuff");
/// assert_eq!(slugify("Inbox/Old"), "inboxold");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase().replace(' ', "-");
    NOT_SLUG_CHARS.replace_all(&lowered, "").into_owned()
}

/// Check that `slug` is already in canonical form
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}

/// Validate a slug
///
/// # Errors
///
/// Returns `TagError::InvalidSlug` if the slug is empty or not canonical.
pub fn validate_slug(slug: &str) -> Result<(), TagError> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(TagError::InvalidSlug(slug.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Mailing Lists"), "mailing-lists");
        assert_eq!(slugify("ALLCAPS"), "allcaps");
    }

    #[test]
    fn test_slugify_drops_unsafe_characters() {
        assert_eq!(slugify("a/b\\c"), "abc");
        assert_eq!(slugify("café?"), "caf");
        assert_eq!(slugify("v1.2_beta"), "v1.2_beta");
    }

    #[test]
    fn test_valid_slugs() {
        assert!(is_valid_slug("work"));
        assert!(is_valid_slug("mailing-lists"));
        assert!(is_valid_slug("2024"));
    }

    #[test]
    fn test_invalid_slugs() {
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Work"));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("path/sep"));
        assert!(matches!(validate_slug("Nope"), Err(TagError::InvalidSlug(s)) if s == "Nope"));
    }
}
