//! CRUD over the `tags` table. `document_id = NULL` means an index-level tag.

use rusqlite::Connection;

use crate::error::Result;
use crate::ids;

/// Full replacement: delete every row for `document_id`, then insert `tags`.
/// A later key in the same call replaces an earlier one.
pub fn replace_for_document(
    conn: &Connection,
    document_id: Option<&str>,
    tags: &std::collections::HashMap<String, String>,
    now: &str,
) -> Result<()> {
    delete_for_document(conn, document_id)?;
    for (key, value) in tags {
        conn.execute(
            "INSERT OR REPLACE INTO tags (id, document_id, key, value, last_modified_utc, created_utc)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            rusqlite::params![ids::new_id(), document_id, key, value, now],
        )?;
    }
    Ok(())
}

pub fn delete_for_document(conn: &Connection, document_id: Option<&str>) -> Result<()> {
    match document_id {
        Some(id) => conn.execute("DELETE FROM tags WHERE document_id = ?1", [id])?,
        None => conn.execute("DELETE FROM tags WHERE document_id IS NULL", [])?,
    };
    Ok(())
}

pub fn list_for_document(conn: &Connection, document_id: Option<&str>) -> Result<std::collections::HashMap<String, String>> {
    let mut stmt = match document_id {
        Some(_) => conn.prepare("SELECT key, value FROM tags WHERE document_id = ?1")?,
        None => conn.prepare("SELECT key, value FROM tags WHERE document_id IS NULL")?,
    };
    let rows: Vec<(String, Option<String>)> = match document_id {
        Some(id) => stmt
            .query_map([id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        None => stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?,
    };
    Ok(rows
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect())
}

/// Whether `document_id` carries every `(key, value)` pair in `required`,
/// exact match on both. Empty `required` trivially matches.
pub fn document_has_all_tags(
    conn: &Connection,
    document_id: &str,
    required: &std::collections::HashMap<String, String>,
) -> Result<bool> {
    if required.is_empty() {
        return Ok(true);
    }
    let carried = list_for_document(conn, Some(document_id))?;
    Ok(required
        .iter()
        .all(|(key, value)| carried.get(key) == Some(value)))
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

    fn map(pairs: &[(&str, &str)]) -> std::collections::HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn replace_then_read_round_trips() {
        let conn = conn();
        let now = ids::now();
        replace_for_document(&conn, Some("doc1"), &map(&[("env", "prod")]), &now).unwrap();
        assert_eq!(list_for_document(&conn, Some("doc1")).unwrap(), map(&[("env", "prod")]));
    }

    #[test]
    fn replace_overwrites_existing_key() {
        let conn = conn();
        let now = ids::now();
        replace_for_document(&conn, Some("doc1"), &map(&[("env", "prod")]), &now).unwrap();
        replace_for_document(&conn, Some("doc1"), &map(&[("env", "dev")]), &now).unwrap();
        assert_eq!(list_for_document(&conn, Some("doc1")).unwrap(), map(&[("env", "dev")]));
    }

    #[test]
    fn has_all_tags_is_exact_and_case_sensitive() {
        let conn = conn();
        let now = ids::now();
        replace_for_document(&conn, Some("doc1"), &map(&[("env", "Prod")]), &now).unwrap();
        assert!(document_has_all_tags(&conn, "doc1", &map(&[("env", "Prod")])).unwrap());
        assert!(!document_has_all_tags(&conn, "doc1", &map(&[("env", "prod")])).unwrap());
    }
}
