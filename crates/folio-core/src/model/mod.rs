pub mod document;
pub mod field;
pub mod version;

pub use document::{Actor, Document, EditState};
pub use field::{FieldBag, FieldValue};
pub use version::{HistoryPage, VersionDiff, VersionSnapshot};
