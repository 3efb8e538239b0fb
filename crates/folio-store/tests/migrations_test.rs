// Integration tests for the migration framework

use rusqlite::Connection;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    let mut conn = setup_test_db();

    let result = folio_store::migrations::apply_migrations(&mut conn);
    assert!(result.is_ok(), "Migrations should succeed: {:?}", result.err());

    let tables = get_table_names(&conn);
    for expected in ["schema_version", "documents", "document_versions"] {
        assert!(
            tables.contains(&expected.to_string()),
            "Missing table: {}",
            expected
        );
    }
}

#[test]
fn test_every_migration_recorded_once() {
    let mut conn = setup_test_db();
    folio_store::migrations::apply_migrations(&mut conn).unwrap();
    folio_store::migrations::apply_migrations(&mut conn).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn test_checksums_recorded() {
    let mut conn = setup_test_db();
    folio_store::migrations::apply_migrations(&mut conn).unwrap();

    let missing: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM schema_version WHERE checksum IS NULL OR length(checksum) != 64",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(missing, 0);
}

#[test]
fn test_latest_version_index_exists() {
    let mut conn = setup_test_db();
    folio_store::migrations::apply_migrations(&mut conn).unwrap();

    let found: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'index' AND name = 'idx_document_versions_latest'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(found, 1);
}
