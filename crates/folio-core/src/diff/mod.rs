//! Snapshot diff engine.
//!
//! Compares two document states field by field over a fixed allow-list and
//! produces a [`VersionDiff`](crate::model::VersionDiff).
//!
//! ```
//! use folio_core::diff::{compute_diff, DiffSchema};
//! use folio_core::model::{FieldBag, FieldValue};
//!
//! let mut new = FieldBag::new();
//! new.insert("title".to_string(), FieldValue::from("A"));
//!
//! let diff = compute_diff(None, &new, &DiffSchema::default());
//! assert_eq!(diff.fields_changed, vec!["title".to_string()]);
//! ```
//!
//! ## Guarantees
//!
//! - **Total**: never fails, for any pair of bags including empty ones.
//! - **Deterministic**: output order follows the schema, then list order.
//! - **Forward compatible**: fields outside the allow-list are ignored.

pub mod engine;
pub mod schema;
pub mod summary;

pub use engine::compute_diff;
pub use schema::DiffSchema;
pub use summary::{changes_summary, NO_CHANGES_SUMMARY};
