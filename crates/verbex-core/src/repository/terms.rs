//! CRUD over the `terms` table, one row per distinct term with rolling
//! document- and total-frequency counters.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::ids;

use super::TermRow;

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<TermRow> {
    Ok(TermRow {
        id: row.get("id")?,
        term: row.get("term")?,
        document_frequency: row.get("document_frequency")?,
        total_frequency: row.get("total_frequency")?,
        last_updated_utc: row.get("last_updated_utc")?,
        created_utc: row.get("created_utc")?,
    })
}

pub fn get_by_text(conn: &Connection, term: &str) -> Result<Option<TermRow>> {
    conn.query_row(
        "SELECT id, term, document_frequency, total_frequency, last_updated_utc, created_utc
         FROM terms WHERE term = ?1",
        [term],
        map_row,
    )
    .optional()
    .map_err(Error::from)
}

/// Create the term row if absent (`document_frequency = 1`,
/// `total_frequency = frequency`), or increment an existing one
/// (`document_frequency += 1`, `total_frequency += frequency`). Returns the
/// term's id.
pub fn upsert_on_add(conn: &Connection, term: &str, frequency: i64, now: &str) -> Result<String> {
    match get_by_text(conn, term)? {
        Some(existing) => {
            conn.execute(
                "UPDATE terms SET document_frequency = document_frequency + 1,
                    total_frequency = total_frequency + ?1, last_updated_utc = ?2
                 WHERE id = ?3",
                rusqlite::params![frequency, now, existing.id],
            )?;
            Ok(existing.id)
        }
        None => {
            let id = ids::new_id();
            conn.execute(
                "INSERT INTO terms (id, term, document_frequency, total_frequency, last_updated_utc, created_utc)
                 VALUES (?1, ?2, 1, ?3, ?4, ?4)",
                rusqlite::params![id, term, frequency, now],
            )?;
            Ok(id)
        }
    }
}

/// Decrement a term's counters when a posting is removed; deletes the row
/// once both counters reach zero.
pub fn decrement_on_remove(conn: &Connection, term_id: &str, term_frequency: i64, now: &str) -> Result<()> {
    conn.execute(
        "UPDATE terms SET document_frequency = document_frequency - 1,
            total_frequency = total_frequency - ?1, last_updated_utc = ?2
         WHERE id = ?3",
        rusqlite::params![term_frequency, now, term_id],
    )?;
    conn.execute(
        "DELETE FROM terms WHERE id = ?1 AND document_frequency <= 0 AND total_frequency <= 0",
        [term_id],
    )?;
    Ok(())
}

pub fn count(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM terms", [], |row| row.get(0))
        .map_err(Error::from)
}

pub fn total_occurrences(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COALESCE(SUM(total_frequency), 0) FROM terms", [], |row| {
        row.get(0)
    })
    .map_err(Error::from)
}

/// `(avg_document_frequency, max_document_frequency)` across all terms.
pub fn document_frequency_stats(conn: &Connection) -> Result<(f64, i64)> {
    conn.query_row(
        "SELECT COALESCE(AVG(document_frequency), 0.0), COALESCE(MAX(document_frequency), 0) FROM terms",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MIGRATIONS;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for migration in MIGRATIONS {
            conn.execute_batch(migration.up).unwrap();
        }
        conn
    }

    #[test]
    fn upsert_creates_then_increments() {
        let conn = conn();
        let now = ids::now();
        let id_a = upsert_on_add(&conn, "fox", 2, &now).unwrap();
        let first = get_by_text(&conn, "fox").unwrap().unwrap();
        assert_eq!(first.document_frequency, 1);
        assert_eq!(first.total_frequency, 2);

        let id_b = upsert_on_add(&conn, "fox", 3, &now).unwrap();
        assert_eq!(id_a, id_b);
        let second = get_by_text(&conn, "fox").unwrap().unwrap();
        assert_eq!(second.document_frequency, 2);
        assert_eq!(second.total_frequency, 5);
    }

    #[test]
    fn decrement_to_zero_deletes_row() {
        let conn = conn();
        let now = ids::now();
        let id = upsert_on_add(&conn, "fox", 2, &now).unwrap();
        decrement_on_remove(&conn, &id, 2, &now).unwrap();
        assert!(get_by_text(&conn, "fox").unwrap().is_none());
    }

    #[test]
    fn decrement_keeps_row_while_other_documents_remain() {
        let conn = conn();
        let now = ids::now();
        let id = upsert_on_add(&conn, "fox", 2, &now).unwrap();
        upsert_on_add(&conn, "fox", 1, &now).unwrap();
        decrement_on_remove(&conn, &id, 2, &now).unwrap();
        let remaining = get_by_text(&conn, "fox").unwrap().unwrap();
        assert_eq!(remaining.document_frequency, 1);
        assert_eq!(remaining.total_frequency, 1);
    }
}
