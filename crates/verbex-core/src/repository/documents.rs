//! CRUD over the `documents` table.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};

use super::DocumentRow;

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get("id")?,
        name: row.get("name")?,
        content_sha256: row.get("content_sha256")?,
        document_length: row.get("document_length")?,
        term_count: row.get("term_count")?,
        indexed_utc: row.get("indexed_utc")?,
        last_modified_utc: row.get("last_modified_utc")?,
        created_utc: row.get("created_utc")?,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn insert(
    conn: &Connection,
    id: &str,
    name: &str,
    content_sha256: &str,
    document_length: i64,
    term_count: i64,
    now: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO documents
            (id, name, content_sha256, document_length, term_count, indexed_utc, last_modified_utc, created_utc)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?6)",
        rusqlite::params![id, name, content_sha256, document_length, term_count, now],
    )?;
    Ok(())
}

pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<DocumentRow>> {
    conn.query_row(
        "SELECT id, name, content_sha256, document_length, term_count, indexed_utc, last_modified_utc, created_utc
         FROM documents WHERE id = ?1",
        [id],
        map_row,
    )
    .optional()
    .map_err(Error::from)
}

pub fn require_by_id(conn: &Connection, id: &str) -> Result<DocumentRow> {
    get_by_id(conn, id)?.ok_or_else(|| Error::not_found("document", id))
}

pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<DocumentRow>> {
    conn.query_row(
        "SELECT id, name, content_sha256, document_length, term_count, indexed_utc, last_modified_utc, created_utc
         FROM documents WHERE name = ?1",
        [name],
        map_row,
    )
    .optional()
    .map_err(Error::from)
}

pub fn list(conn: &Connection) -> Result<Vec<DocumentRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, content_sha256, document_length, term_count, indexed_utc, last_modified_utc, created_utc
         FROM documents ORDER BY created_utc ASC",
    )?;
    let rows = stmt.query_map([], map_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
}

/// Deletes the document row. Returns whether a row existed — not an error
/// when it didn't.
pub fn delete(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM documents WHERE id = ?1", [id])?;
    Ok(affected > 0)
}

pub fn count(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
        .map_err(Error::from)
}

/// `(avg_document_length, min_document_length, max_document_length)` over all
/// documents. `(0.0, 0, 0)` when the index is empty.
pub fn length_stats(conn: &Connection) -> Result<(f64, i64, i64)> {
    conn.query_row(
        "SELECT COALESCE(AVG(document_length), 0.0), COALESCE(MIN(document_length), 0), COALESCE(MAX(document_length), 0)
         FROM documents",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )
    .map_err(Error::from)
}

/// Mean distinct-term count across all documents. `0.0` when the index is
/// empty.
pub fn avg_term_count(conn: &Connection) -> Result<f64> {
    conn.query_row("SELECT COALESCE(AVG(term_count), 0.0) FROM documents", [], |row| row.get(0))
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids;
    use crate::storage::MIGRATIONS;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for migration in MIGRATIONS {
            conn.execute_batch(migration.up).unwrap();
        }
        conn
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = conn();
        let id = ids::new_id();
        let now = ids::now();
        insert(&conn, &id, "doc1", "hash", 10, 2, &now).unwrap();

        let fetched = get_by_id(&conn, &id).unwrap().unwrap();
        assert_eq!(fetched.name, "doc1");
        assert_eq!(fetched.document_length, 10);
        assert_eq!(fetched.term_count, 2);
    }

    #[test]
    fn get_by_name_misses_return_none() {
        let conn = conn();
        assert!(get_by_name(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn delete_reports_existence() {
        let conn = conn();
        let id = ids::new_id();
        let now = ids::now();
        insert(&conn, &id, "doc1", "hash", 0, 0, &now).unwrap();
        assert!(delete(&conn, &id).unwrap());
        assert!(!delete(&conn, &id).unwrap());
    }

    #[test]
    fn length_stats_on_empty_index() {
        let conn = conn();
        assert_eq!(length_stats(&conn).unwrap(), (0.0, 0, 0));
    }

    #[test]
    fn avg_term_count_averages_distinct_term_counts() {
        let conn = conn();
        insert(&conn, &ids::new_id(), "doc1", "hash", 10, 2, &ids::now()).unwrap();
        insert(&conn, &ids::new_id(), "doc2", "hash", 10, 4, &ids::now()).unwrap();
        assert_eq!(avg_term_count(&conn).unwrap(), 3.0);
    }
}
