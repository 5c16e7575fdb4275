//! Auto-tagging filters
//!
//! A filter pairs opaque search terms with a list of tag actions (`+tid` to
//! apply a tag, `-tid` to remove it). Filters live at dense base-36
//! positions; the position is the order the mail client evaluates them in.
//!
//! # Features
//!
//! - **Append / replace**: store a filter at the next position or at a given one
//! - **Remove**: by position or by exact terms, leaving a cleared slot behind
//! - **Move**: shift a filter to a new position with adjacent swaps
//! - **List / search**: by type, by terms, or by free text over a human view
//!
//! # Examples
//!
//! ```
//! use mailtag::filters::{FilterList, FilterRecord, FilterType, TypeSelection};
//!
//! let mut list = FilterList::new();
//! list.append(FilterRecord::new("*", "+1".parse().unwrap(), "New mail"));
//! list.append(
//!     FilterRecord::new("@read", "-1".parse().unwrap(), "Read mail")
//!         .with_type(FilterType::System),
//! );
//!
//! assert_eq!(list.list(None, &TypeSelection::default()).len(), 1);
//! assert_eq!(list.list(None, &TypeSelection::Any).len(), 2);
//! ```

pub mod error;
pub mod operations;
pub mod types;

pub use error::FilterError;
pub use operations::{FilterList, FilterListing, RemoveReport};
pub use types::{
    FIRST_POSITION, FilterPosition, FilterRecord, FilterType, TagAction, TagActions, TypeSelection,
};
