//! folio store - SQLite persistence for documents and their version history
//!
//! Provides:
//! - Connection setup (WAL, foreign keys, busy timeout) and immediate write transactions
//! - Embedded, checksummed schema migrations
//! - Document and version repositories

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

pub use errors::Result;
