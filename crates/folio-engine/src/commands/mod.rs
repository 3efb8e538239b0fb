//! Command orchestration layer.
//!
//! Coordinates the pure core (lease decisions, diffs, snapshot construction)
//! with the SQLite store. Every public command owns its boundary logging.

pub mod engine_command;
pub mod lease;
pub mod version;
