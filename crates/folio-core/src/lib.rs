//! folio core - document versioning and edit-lease kernel
//!
//! Pure domain logic with no I/O:
//! - Field-bag document model and immutable version snapshots
//! - Structural diff engine and change summaries
//! - Edit lease state machine with lazy expiry
//! - Validation rules for edit reasons and field bags
//! - Seams for clock, change notification and access policy
//! - Error and logging facilities shared by the store and engine crates

pub mod cache;
pub mod clock;
pub mod config;
pub mod diff;
pub mod errors;
pub mod lease;
pub mod logging_facility;
pub mod model;
pub mod notifier;
pub mod policy;
pub mod rules;
pub mod versioning;

#[doc(hidden)]
pub use folio_core_types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use errors::{ExError, ExErrorKind, FolioError, Result};
pub use model::{Actor, Document, EditState, FieldBag, FieldValue, VersionDiff, VersionSnapshot};
pub use notifier::{ChangeEvent, ChangeNotifier, NoopChangeNotifier};
pub use policy::{AccessPolicy, AllowAllAccessPolicy};
