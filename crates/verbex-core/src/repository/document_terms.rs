//! CRUD over the `document_terms` posting table, the per-document postings
//! that back both term-frequency lookups and term reference counting.

use rusqlite::Connection;

use crate::error::{Error, Result};

use super::{DocumentTermRow, TermMatch};

fn encode_positions(positions: &[i64]) -> Result<String> {
    serde_json::to_string(positions).map_err(|err| Error::Corruption {
        detail: format!("failed to encode position array: {err}"),
    })
}

fn decode_positions(raw: &str) -> Result<Vec<i64>> {
    serde_json::from_str(raw).map_err(|err| Error::Corruption {
        detail: format!("failed to decode position array: {err}"),
    })
}

/// Insert one posting row linking a document to a term. Position arrays are
/// serialized as JSON integer arrays.
#[allow(clippy::too_many_arguments)]
pub fn insert(
    conn: &Connection,
    id: &str,
    document_id: &str,
    term_id: &str,
    term_frequency: i64,
    character_positions: &[i64],
    term_positions: &[i64],
    now: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO document_terms
            (id, document_id, term_id, term_frequency, character_positions, term_positions, last_modified_utc, created_utc)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        rusqlite::params![
            id,
            document_id,
            term_id,
            term_frequency,
            encode_positions(character_positions)?,
            encode_positions(term_positions)?,
            now,
        ],
    )?;
    Ok(())
}

/// Every `(term_id, term_frequency)` pair posted for `document_id`, used by
/// `remove_document` to decrement the owning term rows before the postings
/// themselves are deleted.
pub fn term_frequencies_for_document(conn: &Connection, document_id: &str) -> Result<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT term_id, term_frequency FROM document_terms WHERE document_id = ?1",
    )?;
    let rows = stmt.query_map([document_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
}

pub fn delete_for_document(conn: &Connection, document_id: &str) -> Result<()> {
    conn.execute("DELETE FROM document_terms WHERE document_id = ?1", [document_id])?;
    Ok(())
}

/// Resolve every posting for the given term ids, joined with the term text
/// itself.
pub fn matches_for_terms(conn: &Connection, term_ids_and_text: &[(String, String)]) -> Result<Vec<TermMatch>> {
    if term_ids_and_text.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders: Vec<String> = (1..=term_ids_and_text.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT document_id, term_id, term_frequency FROM document_terms WHERE term_id IN ({})",
        placeholders.join(", ")
    );
    let term_text_by_id: std::collections::HashMap<&str, &str> = term_ids_and_text
        .iter()
        .map(|(id, text)| (id.as_str(), text.as_str()))
        .collect();

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = term_ids_and_text
        .iter()
        .map(|(id, _)| id as &dyn rusqlite::ToSql)
        .collect();
    let rows = stmt.query_map(params.as_slice(), |row| {
        let document_id: String = row.get(0)?;
        let term_id: String = row.get(1)?;
        let term_frequency: i64 = row.get(2)?;
        Ok((document_id, term_id, term_frequency))
    })?;

    let mut matches = Vec::new();
    for row in rows {
        let (document_id, term_id, term_frequency) = row?;
        let term = term_text_by_id
            .get(term_id.as_str())
            .map(|s| s.to_string())
            .unwrap_or_default();
        matches.push(TermMatch {
            document_id,
            term_id,
            term,
            term_frequency,
        });
    }
    Ok(matches)
}

/// Load the full posting row for `(document_id, term_id)`, used for
/// per-term-frequency reporting in search results.
pub fn get(conn: &Connection, document_id: &str, term_id: &str) -> Result<Option<DocumentTermRow>> {
    use rusqlite::OptionalExtension;
    let raw = conn
        .query_row(
            "SELECT id, document_id, term_id, term_frequency, character_positions, term_positions, last_modified_utc, created_utc
             FROM document_terms WHERE document_id = ?1 AND term_id = ?2",
            rusqlite::params![document_id, term_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            },
        )
        .optional()?;

    raw.map(
        |(id, document_id, term_id, term_frequency, char_raw, term_raw, last_modified_utc, created_utc)| -> Result<DocumentTermRow> {
            Ok(DocumentTermRow {
                id,
                document_id,
                term_id,
                term_frequency,
                character_positions: decode_positions(&char_raw)?,
                term_positions: decode_positions(&term_raw)?,
                last_modified_utc,
                created_utc,
            })
        },
    )
    .transpose()
}
