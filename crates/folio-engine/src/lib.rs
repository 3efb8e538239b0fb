//! folio engine - orchestration layer
//!
//! Runs lease and version commands against the SQLite store inside
//! immediate transactions, delivers change notifications after commit and
//! owns operation-boundary logging.

pub mod cache;
pub mod commands;
pub mod context;

pub use context::EngineContext;
