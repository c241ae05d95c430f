//! CRUD over the `labels` table. `document_id = NULL` means an index-level
//! label.

use rusqlite::Connection;

use crate::error::Result;
use crate::ids;

/// Full replacement: delete every row for `document_id`, then insert `labels`
/// (lowercased, trimmed, deduplicated).
pub fn replace_for_document(conn: &Connection, document_id: Option<&str>, labels: &[String], now: &str) -> Result<()> {
    delete_for_document(conn, document_id)?;

    let mut seen = std::collections::HashSet::new();
    for label in labels {
        let normalized = label.trim().to_lowercase();
        if normalized.is_empty() || !seen.insert(normalized.clone()) {
            continue;
        }
        conn.execute(
            "INSERT OR IGNORE INTO labels (id, document_id, label, last_modified_utc, created_utc)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![ids::new_id(), document_id, normalized, now],
        )?;
    }
    Ok(())
}

pub fn delete_for_document(conn: &Connection, document_id: Option<&str>) -> Result<()> {
    match document_id {
        Some(id) => conn.execute("DELETE FROM labels WHERE document_id = ?1", [id])?,
        None => conn.execute("DELETE FROM labels WHERE document_id IS NULL", [])?,
    };
    Ok(())
}

pub fn list_for_document(conn: &Connection, document_id: Option<&str>) -> Result<Vec<String>> {
    let mut stmt = match document_id {
        Some(_) => conn.prepare("SELECT label FROM labels WHERE document_id = ?1 ORDER BY label")?,
        None => conn.prepare("SELECT label FROM labels WHERE document_id IS NULL ORDER BY label")?,
    };
    let rows = match document_id {
        Some(id) => stmt.query_map([id], |row| row.get(0))?.collect::<rusqlite::Result<Vec<String>>>(),
        None => stmt.query_map([], |row| row.get(0))?.collect::<rusqlite::Result<Vec<String>>>(),
    };
    Ok(rows?)
}

/// Whether `document_id` carries every label in `required` (case-insensitive).
/// Empty `required` trivially matches.
pub fn document_has_all_labels(conn: &Connection, document_id: &str, required: &[String]) -> Result<bool> {
    if required.is_empty() {
        return Ok(true);
    }
    let carried: std::collections::HashSet<String> = list_for_document(conn, Some(document_id))?
        .into_iter()
        .collect();
    Ok(required
        .iter()
        .all(|label| carried.contains(&label.trim().to_lowercase())))
}
