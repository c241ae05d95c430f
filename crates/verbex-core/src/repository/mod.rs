//! Typed CRUD over the six tables backing an index.
//!
//! Every function here takes a `&rusqlite::Connection` (a bare connection or
//! a `Transaction`, which derefs to one) so the indexing and query services
//! decide the transaction boundary, not this layer.

pub mod document_terms;
pub mod documents;
pub mod labels;
pub mod metadata;
pub mod tags;
pub mod terms;

/// A `documents` row.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub id: String,
    pub name: String,
    pub content_sha256: String,
    pub document_length: i64,
    pub term_count: i64,
    pub indexed_utc: String,
    pub last_modified_utc: String,
    pub created_utc: String,
}

/// A `terms` row.
#[derive(Debug, Clone, PartialEq)]
pub struct TermRow {
    pub id: String,
    pub term: String,
    pub document_frequency: i64,
    pub total_frequency: i64,
    pub last_updated_utc: String,
    pub created_utc: String,
}

/// A `document_terms` (posting) row, positions deserialized from JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTermRow {
    pub id: String,
    pub document_id: String,
    pub term_id: String,
    pub term_frequency: i64,
    pub character_positions: Vec<i64>,
    pub term_positions: Vec<i64>,
    pub last_modified_utc: String,
    pub created_utc: String,
}

/// A resolved posting joined against a query term, as consumed by the query
/// service.
#[derive(Debug, Clone, PartialEq)]
pub struct TermMatch {
    pub document_id: String,
    pub term_id: String,
    pub term: String,
    pub term_frequency: i64,
}

/// The singleton `index_metadata` row.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMetadataRow {
    pub id: String,
    pub name: String,
    pub created_utc: String,
    pub last_modified_utc: String,
}
