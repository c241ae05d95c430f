//! Aggregate statistics over the whole index and over a single term. Each
//! function runs under the caller's read lock.

use rusqlite::Connection;

use crate::error::Result;
use crate::repository::{documents, metadata, terms};

/// Index-wide rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats {
    pub document_count: i64,
    pub term_count: i64,
    pub total_term_occurrences: i64,
    /// Mean number of distinct terms per document.
    pub avg_terms_per_document: f64,
    pub avg_document_frequency: f64,
    pub max_document_frequency: i64,
    pub min_document_length: i64,
    pub max_document_length: i64,
    pub avg_document_length: f64,
    /// When this index was first opened.
    pub created_utc: String,
    /// When this index last committed a write.
    pub last_modified_utc: String,
}

/// Per-term rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct TermStats {
    pub term: String,
    pub document_frequency: i64,
    pub total_frequency: i64,
    pub inverse_document_frequency: f64,
    pub avg_frequency_per_document: f64,
    pub max_frequency_in_document: i64,
    pub min_frequency_in_document: i64,
}

pub fn index_stats(conn: &Connection) -> Result<IndexStats> {
    let document_count = documents::count(conn)?;
    let term_count = terms::count(conn)?;
    let total_term_occurrences = terms::total_occurrences(conn)?;
    let (avg_document_frequency, max_document_frequency) = terms::document_frequency_stats(conn)?;
    let (avg_document_length, min_document_length, max_document_length) = documents::length_stats(conn)?;
    let avg_terms_per_document = documents::avg_term_count(conn)?;
    let meta = metadata::get(conn)?;

    Ok(IndexStats {
        document_count,
        term_count,
        total_term_occurrences,
        avg_terms_per_document,
        avg_document_frequency,
        max_document_frequency,
        min_document_length,
        max_document_length,
        avg_document_length,
        created_utc: meta.created_utc,
        last_modified_utc: meta.last_modified_utc,
    })
}

/// `None` if `text` is not a term currently in the index.
pub fn term_stats(conn: &Connection, text: &str) -> Result<Option<TermStats>> {
    let Some(term_row) = terms::get_by_text(conn, text)? else {
        return Ok(None);
    };

    let document_count = documents::count(conn)?;
    let inverse_document_frequency = if term_row.document_frequency > 0 && document_count > 0 {
        (document_count as f64 / term_row.document_frequency as f64).ln()
    } else {
        0.0
    };

    let (avg_frequency_per_document, max_frequency_in_document, min_frequency_in_document) =
        per_document_frequency_stats(conn, &term_row.id)?;

    Ok(Some(TermStats {
        term: term_row.term,
        document_frequency: term_row.document_frequency,
        total_frequency: term_row.total_frequency,
        inverse_document_frequency,
        avg_frequency_per_document,
        max_frequency_in_document,
        min_frequency_in_document,
    }))
}

fn per_document_frequency_stats(conn: &Connection, term_id: &str) -> Result<(f64, i64, i64)> {
    conn.query_row(
        "SELECT COALESCE(AVG(term_frequency), 0.0), COALESCE(MAX(term_frequency), 0), COALESCE(MIN(term_frequency), 0)
         FROM document_terms WHERE term_id = ?1",
        [term_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )
    .map_err(crate::error::Error::from)
}
