//! Tag store module
//!
//! Tags are labeled categories applied to messages. Each tag carries
//! behavior attributes (type, whether it hides messages from search) and
//! display attributes (icon, label, display context and order).
//!
//! # Features
//!
//! - **Create**: bulk creation with all-or-nothing slug validation
//! - **Delete**: best-effort deletion that untags messages first
//! - **Mutate**: in-place attribute updates with type coercion
//! - **Reorder**: display order recomputed after every create/delete
//!
//! # Examples
//!
//! ```
//! use mailtag::tags::{TagSpec, TagStore};
//!
//! let mut store = TagStore::new();
//! let created = store.create_tags(vec![TagSpec::new("Work")]).unwrap();
//!
//! assert_eq!(created[0].slug, "work");
//! assert_eq!(created[0].display_order, 1.0);
//! ```

pub mod error;
pub mod slug;
pub mod store;
pub mod types;

pub use error::TagError;
pub use slug::{is_valid_slug, slugify, validate_slug};
pub use store::{DeleteReport, TagStore};
pub use types::{ATTRIBUTES, DisplayContext, TagId, TagRecord, TagSpec, TagType, WILDCARD};
