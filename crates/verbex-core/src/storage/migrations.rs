//! Database migrations.
//!
//! Schema migration definitions for the storage layer, applied in order
//! against a `schema_version` table, covering the six tables that back an
//! index.

/// A single database migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Version number, applied in ascending order.
    pub version: u32,
    /// Human-readable description, logged when applied.
    pub description: &'static str,
    /// SQL to apply.
    pub up: &'static str,
}

/// Ordered migration list.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Initial schema: documents, terms, document_terms, labels, tags, index_metadata",
    up: MIGRATION_V1_UP,
}];

const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS index_metadata (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_utc TEXT NOT NULL,
    last_modified_utc TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    content_sha256 TEXT NOT NULL,
    document_length INTEGER NOT NULL,
    term_count INTEGER NOT NULL,
    indexed_utc TEXT NOT NULL,
    last_modified_utc TEXT NOT NULL,
    created_utc TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_name ON documents(name);

CREATE TABLE IF NOT EXISTS terms (
    id TEXT PRIMARY KEY,
    term TEXT NOT NULL UNIQUE,
    document_frequency INTEGER NOT NULL DEFAULT 0,
    total_frequency INTEGER NOT NULL DEFAULT 0,
    last_updated_utc TEXT NOT NULL,
    created_utc TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_terms_term ON terms(term);

CREATE TABLE IF NOT EXISTS document_terms (
    id TEXT PRIMARY KEY,
    document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    term_id TEXT NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
    term_frequency INTEGER NOT NULL,
    character_positions TEXT NOT NULL,
    term_positions TEXT NOT NULL,
    last_modified_utc TEXT NOT NULL,
    created_utc TEXT NOT NULL,
    UNIQUE(document_id, term_id)
);

CREATE INDEX IF NOT EXISTS idx_document_terms_document ON document_terms(document_id);
CREATE INDEX IF NOT EXISTS idx_document_terms_term ON document_terms(term_id);

CREATE TABLE IF NOT EXISTS labels (
    id TEXT PRIMARY KEY,
    document_id TEXT REFERENCES documents(id) ON DELETE CASCADE,
    label TEXT NOT NULL,
    last_modified_utc TEXT NOT NULL,
    created_utc TEXT NOT NULL,
    UNIQUE(document_id, label)
);

CREATE INDEX IF NOT EXISTS idx_labels_label ON labels(label);

CREATE TABLE IF NOT EXISTS tags (
    id TEXT PRIMARY KEY,
    document_id TEXT REFERENCES documents(id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT,
    last_modified_utc TEXT NOT NULL,
    created_utc TEXT NOT NULL,
    UNIQUE(document_id, key)
);

CREATE INDEX IF NOT EXISTS idx_tags_key_value ON tags(key, value);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// Read the highest applied migration version, `0` on a fresh database.
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Probe that the expected tables exist with a plausible shape. Used to
/// distinguish a fresh database (needs migrating) from one that exists but
/// was created by something else (corruption).
pub fn probe_schema(conn: &rusqlite::Connection) -> rusqlite::Result<bool> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
            ('documents','terms','document_terms','labels','tags','index_metadata')",
        [],
        |row| row.get(0),
    )?;
    Ok(count == 0 || count == 6)
}

/// Apply every migration newer than the current schema version.
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                description = migration.description,
                "applying migration"
            );
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn fresh_database_applies_all_migrations() {
        let conn = Connection::open_in_memory().unwrap();
        let applied = apply_migrations(&conn).unwrap();
        assert_eq!(applied, MIGRATIONS.len() as u32);
        assert_eq!(get_current_version(&conn).unwrap(), 1);
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();
        let applied_again = apply_migrations(&conn).unwrap();
        assert_eq!(applied_again, 0);
    }

    #[test]
    fn probe_schema_accepts_fresh_or_complete() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(probe_schema(&conn).unwrap());
        apply_migrations(&conn).unwrap();
        assert!(probe_schema(&conn).unwrap());
    }
}
