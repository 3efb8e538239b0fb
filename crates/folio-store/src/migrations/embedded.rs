//! Embedded SQL migrations
//!
//! Migrations are embedded at compile time using include_str!

/// Migration metadata
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// All embedded migrations, in application order
pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_documents",
            sql: include_str!("../../migrations/001_documents.sql"),
        },
        Migration {
            id: "002_document_versions",
            sql: include_str!("../../migrations/002_document_versions.sql"),
        },
    ]
}
