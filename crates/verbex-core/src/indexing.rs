//! Indexing service: wraps the analysis pipeline and repository mutations
//! into the atomic add/remove/update operations that keep the
//! `documents`/`terms`/`document_terms` tables coherent.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::analysis::{group_by_term, Analyzer};
use crate::error::{Error, Result};
use crate::ids;
use crate::repository::{document_terms, documents, labels, tags};

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(out, "{byte:02x}").expect("writing to a String cannot fail");
    }
    out
}

/// Analyze and insert `content` as a new document named `name`, maintaining
/// the `documents`/`terms`/`document_terms` invariants. Must run inside the
/// caller's write transaction.
pub fn add_document(
    tx: &rusqlite::Transaction,
    analyzer: &Analyzer,
    name: &str,
    content: &str,
    label_list: &[String],
    tag_map: &HashMap<String, String>,
) -> Result<String> {
    if name.trim().is_empty() {
        return Err(Error::invalid_argument("name", "must not be empty"));
    }
    if documents::get_by_name(tx, name)?.is_some() {
        return Err(Error::already_exists("document", name));
    }

    let now = ids::now();
    let document_id = ids::new_id();
    let content_sha256 = sha256_hex(content);
    let document_length = content.chars().count() as i64;

    let tokens = analyzer.analyze(content);
    let occurrences = group_by_term(tokens);

    documents::insert(
        tx,
        &document_id,
        name,
        &content_sha256,
        document_length,
        occurrences.len() as i64,
        &now,
    )?;

    for occurrence in &occurrences {
        let term_id = crate::repository::terms::upsert_on_add(
            tx,
            &occurrence.term,
            occurrence.frequency as i64,
            &now,
        )?;
        document_terms::insert(
            tx,
            &ids::new_id(),
            &document_id,
            &term_id,
            occurrence.frequency as i64,
            &occurrence.char_positions,
            &occurrence.word_positions,
            &now,
        )?;
    }

    labels::replace_for_document(tx, Some(document_id.as_str()), label_list, &now)?;
    tags::replace_for_document(tx, Some(document_id.as_str()), tag_map, &now)?;

    Ok(document_id)
}

/// Remove a document and restore term counters. Returns `false`, not an
/// error, if it didn't exist.
pub fn remove_document(tx: &rusqlite::Transaction, document_id: &str) -> Result<bool> {
    if documents::get_by_id(tx, document_id)?.is_none() {
        return Ok(false);
    }

    let now = ids::now();
    let postings = document_terms::term_frequencies_for_document(tx, document_id)?;
    for (term_id, term_frequency) in postings {
        crate::repository::terms::decrement_on_remove(tx, &term_id, term_frequency, &now)?;
    }

    document_terms::delete_for_document(tx, document_id)?;
    labels::delete_for_document(tx, Some(document_id))?;
    tags::delete_for_document(tx, Some(document_id))?;
    documents::delete(tx, document_id)?;

    Ok(true)
}

/// Full replacement of a document's (or, with `document_id = None`, the
/// index's) labels.
pub fn update_document_labels(tx: &rusqlite::Transaction, document_id: Option<&str>, labels_in: &[String]) -> Result<()> {
    if let Some(id) = document_id {
        documents::require_by_id(tx, id)?;
    }
    labels::replace_for_document(tx, document_id, labels_in, &ids::now())
}

/// Full replacement of a document's (or the index's) tags.
pub fn update_document_tags(
    tx: &rusqlite::Transaction,
    document_id: Option<&str>,
    tags_in: &HashMap<String, String>,
) -> Result<()> {
    if let Some(id) = document_id {
        documents::require_by_id(tx, id)?;
    }
    tags::replace_for_document(tx, document_id, tags_in, &ids::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MIGRATIONS;
    use rusqlite::Connection;

    fn open_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for migration in MIGRATIONS {
            conn.execute_batch(migration.up).unwrap();
        }
        conn.execute(
            "INSERT INTO index_metadata (id, name, created_utc, last_modified_utc) VALUES ('m','idx','t','t')",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn add_document_populates_all_three_tables() {
        let mut conn = open_conn();
        let analyzer = Analyzer::identity();
        let tx = conn.transaction().unwrap();
        let id = add_document(&tx, &analyzer, "doc1", "the quick brown fox", &[], &HashMap::new()).unwrap();
        tx.commit().unwrap();

        let doc = documents::get_by_id(&conn, &id).unwrap().unwrap();
        assert_eq!(doc.term_count, 4);
        assert_eq!(doc.document_length, 19);

        let term = crate::repository::terms::get_by_text(&conn, "fox").unwrap().unwrap();
        assert_eq!(term.document_frequency, 1);
    }

    #[test]
    fn add_document_rejects_duplicate_name() {
        let mut conn = open_conn();
        let analyzer = Analyzer::identity();
        {
            let tx = conn.transaction().unwrap();
            add_document(&tx, &analyzer, "doc1", "hello", &[], &HashMap::new()).unwrap();
            tx.commit().unwrap();
        }
        let tx = conn.transaction().unwrap();
        let result = add_document(&tx, &analyzer, "doc1", "world", &[], &HashMap::new());
        assert!(matches!(result, Err(Error::AlreadyExists { .. })));
    }

    #[test]
    fn remove_document_restores_term_counters() {
        let mut conn = open_conn();
        let analyzer = Analyzer::identity();
        let doc_id = {
            let tx = conn.transaction().unwrap();
            let id = add_document(&tx, &analyzer, "doc1", "alpha alpha alpha", &[], &HashMap::new()).unwrap();
            tx.commit().unwrap();
            id
        };
        assert_eq!(
            crate::repository::terms::get_by_text(&conn, "alpha").unwrap().unwrap().total_frequency,
            3
        );

        let tx = conn.transaction().unwrap();
        let removed = remove_document(&tx, &doc_id).unwrap();
        tx.commit().unwrap();

        assert!(removed);
        assert!(crate::repository::terms::get_by_text(&conn, "alpha").unwrap().is_none());
        assert!(documents::get_by_id(&conn, &doc_id).unwrap().is_none());
    }

    #[test]
    fn remove_document_missing_returns_false() {
        let mut conn = open_conn();
        let tx = conn.transaction().unwrap();
        assert!(!remove_document(&tx, "missing").unwrap());
        tx.commit().unwrap();
    }

    #[test]
    fn empty_content_creates_document_with_no_postings() {
        let mut conn = open_conn();
        let analyzer = Analyzer::identity();
        let tx = conn.transaction().unwrap();
        let id = add_document(&tx, &analyzer, "empty", "", &[], &HashMap::new()).unwrap();
        tx.commit().unwrap();

        let doc = documents::get_by_id(&conn, &id).unwrap().unwrap();
        assert_eq!(doc.document_length, 0);
        assert_eq!(doc.term_count, 0);
    }
}
