//! # Verbex Core
//!
//! Storage and query engine behind a multi-tenant full-text search service.
//! Each [`Index`] is a self-contained inverted index over a collection of
//! short-to-medium text documents with attached labels and key/value tags:
//! add, retrieve, delete, and search documents; update per-document and
//! per-index metadata; read aggregate statistics.
//!
//! The HTTP API, dashboard, client SDKs, CLI wrapper, and auth/session layer
//! are external collaborators that consume the operations on [`Index`]; none
//! of them live in this crate.
//!
//! ```
//! use verbex_core::{IndexConfig, Index, SearchRequest};
//!
//! let index = Index::create(IndexConfig::in_memory("demo")).unwrap();
//! index.add_document("doc1", "The quick brown fox jumps over the lazy dog.", &[], &Default::default(), None).unwrap();
//! let response = index.search(&SearchRequest::new("fox"), None).unwrap();
//! assert_eq!(response.results.len(), 1);
//! ```

mod analysis;
mod cancel;
mod config;
mod error;
mod ids;
mod indexing;
mod query;
mod repository;
mod stats;
mod storage;

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;

pub use analysis::Analyzer;
pub use cancel::CancellationToken;
pub use config::{IndexConfig, LemmatizerHook, StopWordHook, StorageMode};
pub use error::{Error, Result};
pub use query::{Bm25Scorer, Scorer, ScoringContext, SearchRequest, SearchResponse, SearchResult};
pub use repository::DocumentRow;
pub use stats::{IndexStats, TermStats};

use storage::StorageDriver;

/// Lifecycle state enforced at the top of every public [`Index`] method.
/// `Opening`/`Closing` are held only for the duration of the call that
/// performs the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexState {
    Closed,
    Opening,
    Open,
    Closing,
}

/// A single named full-text search index: the public facade over the
/// storage driver, repository layer, analysis pipeline, indexing service,
/// query service, and statistics.
pub struct Index {
    config: IndexConfig,
    driver: StorageDriver,
    analyzer: Analyzer,
    scorer: Box<dyn Scorer>,
    state: Mutex<IndexState>,
}

impl Index {
    /// Open (creating the schema on first use) the index described by
    /// `config`. `create` and `open` are the same operation here: migrations
    /// are idempotent, so there is nothing "create-only" to distinguish.
    pub fn create(config: IndexConfig) -> Result<Self> {
        Self::open(config)
    }

    /// Open the index described by `config`, creating its storage on first use.
    pub fn open(config: IndexConfig) -> Result<Self> {
        let index = Self {
            driver: StorageDriver::new(config.storage_mode, config.db_path()),
            analyzer: Analyzer::from_config(&config),
            scorer: Box::new(Bm25Scorer::default()),
            state: Mutex::new(IndexState::Opening),
            config,
        };

        index.driver.open(&index.config.name)?;
        *index.state.lock() = IndexState::Open;
        tracing::info!(index = %index.config.name, "index opened");
        Ok(index)
    }

    /// Permanently remove an on-disk index's storage. A no-op for
    /// `in_memory` configurations, which have nothing on disk to remove.
    pub fn delete_index(config: &IndexConfig) -> Result<()> {
        let Some(path) = config.db_path() else {
            return Ok(());
        };
        for suffix in ["", "-wal", "-shm"] {
            let candidate = std::path::PathBuf::from(format!("{}{suffix}", path.display()));
            if candidate.exists() {
                std::fs::remove_file(&candidate).map_err(|cause| Error::Io {
                    path: candidate.display().to_string(),
                    cause,
                })?;
            }
        }
        Ok(())
    }

    fn require_open(&self) -> Result<()> {
        if *self.state.lock() == IndexState::Open {
            Ok(())
        } else {
            Err(Error::NotOpen)
        }
    }

    /// Close the index, checkpointing on-disk storage first. Idempotent.
    pub fn close(&self) -> Result<()> {
        *self.state.lock() = IndexState::Closing;
        self.driver.close()?;
        *self.state.lock() = IndexState::Closed;
        Ok(())
    }

    /// Best-effort close that swallows I/O errors, guaranteeing resource
    /// release.
    pub fn dispose(&self) {
        *self.state.lock() = IndexState::Closing;
        self.driver.dispose();
        *self.state.lock() = IndexState::Closed;
    }

    /// Add a new document, maintaining the term/document_terms/documents
    /// invariants.
    pub fn add_document(
        &self,
        name: &str,
        content: &str,
        labels: &[String],
        tags: &HashMap<String, String>,
        cancel: Option<&CancellationToken>,
    ) -> Result<String> {
        self.require_open()?;
        let analyzer = &self.analyzer;
        self.driver
            .execute_write(cancel, |tx| indexing::add_document(tx, analyzer, name, content, labels, tags))
    }

    /// Look up a document by id.
    pub fn get_document(&self, id: &str, cancel: Option<&CancellationToken>) -> Result<DocumentRow> {
        self.require_open()?;
        self.driver.execute_read(cancel, |conn| repository::documents::require_by_id(conn, id))
    }

    /// All documents in the index, oldest first.
    pub fn list_documents(&self, cancel: Option<&CancellationToken>) -> Result<Vec<DocumentRow>> {
        self.require_open()?;
        self.driver.execute_read(cancel, repository::documents::list)
    }

    /// Remove a document, restoring term counters. Returns `false`, not an
    /// error, if it didn't exist.
    pub fn delete_document(&self, id: &str, cancel: Option<&CancellationToken>) -> Result<bool> {
        self.require_open()?;
        self.driver.execute_write(cancel, |tx| indexing::remove_document(tx, id))
    }

    /// Full replacement of a document's labels.
    pub fn update_document_labels(&self, id: &str, labels: &[String], cancel: Option<&CancellationToken>) -> Result<()> {
        self.require_open()?;
        self.driver
            .execute_write(cancel, |tx| indexing::update_document_labels(tx, Some(id), labels))
    }

    /// Full replacement of a document's tags.
    pub fn update_document_tags(
        &self,
        id: &str,
        tags: &HashMap<String, String>,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        self.require_open()?;
        self.driver
            .execute_write(cancel, |tx| indexing::update_document_tags(tx, Some(id), tags))
    }

    /// Attach an index-level label (`document_id = NULL`).
    pub fn add_label_to_index(&self, label: &str, cancel: Option<&CancellationToken>) -> Result<()> {
        self.require_open()?;
        let current = self.driver.execute_read(None, |conn| repository::labels::list_for_document(conn, None))?;
        let mut labels = current;
        labels.push(label.to_string());
        self.driver
            .execute_write(cancel, |tx| indexing::update_document_labels(tx, None, &labels))
    }

    /// Set a single index-level tag (`document_id = NULL`).
    pub fn set_tag_on_index(&self, key: &str, value: &str, cancel: Option<&CancellationToken>) -> Result<()> {
        self.require_open()?;
        let mut tags = self.driver.execute_read(None, |conn| repository::tags::list_for_document(conn, None))?;
        tags.insert(key.to_string(), value.to_string());
        self.driver
            .execute_write(cancel, |tx| indexing::update_document_tags(tx, None, &tags))
    }

    /// Full replacement of index-level labels.
    pub fn update_index_labels(&self, labels: &[String], cancel: Option<&CancellationToken>) -> Result<()> {
        self.require_open()?;
        self.driver
            .execute_write(cancel, |tx| indexing::update_document_labels(tx, None, labels))
    }

    /// Full replacement of index-level tags.
    pub fn update_index_tags(&self, tags: &HashMap<String, String>, cancel: Option<&CancellationToken>) -> Result<()> {
        self.require_open()?;
        self.driver
            .execute_write(cancel, |tx| indexing::update_document_tags(tx, None, tags))
    }

    /// Run a search.
    pub fn search(&self, request: &SearchRequest, cancel: Option<&CancellationToken>) -> Result<SearchResponse> {
        self.require_open()?;
        let analyzer = &self.analyzer;
        let scorer = self.scorer.as_ref();
        self.driver.execute_read(cancel, |conn| query::search(conn, analyzer, scorer, request))
    }

    /// Index-wide statistics.
    pub fn index_stats(&self, cancel: Option<&CancellationToken>) -> Result<IndexStats> {
        self.require_open()?;
        self.driver.execute_read(cancel, stats::index_stats)
    }

    /// Per-term statistics; `None` if `text` is not currently in the index.
    pub fn term_stats(&self, text: &str, cancel: Option<&CancellationToken>) -> Result<Option<TermStats>> {
        self.require_open()?;
        self.driver.execute_read(cancel, |conn| stats::term_stats(conn, text))
    }

    /// Snapshot an in-memory index to `target_path`, or checkpoint an
    /// on-disk one.
    pub fn flush(&self, target_path: Option<&Path>, cancel: Option<&CancellationToken>) -> Result<()> {
        self.require_open()?;
        self.driver.flush(target_path, cancel)
    }

    /// Explicit WAL checkpoint; a no-op for in-memory indices.
    pub fn checkpoint(&self) -> Result<()> {
        self.require_open()?;
        self.driver.checkpoint()
    }

    /// The configuration this index was opened with.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        if *self.state.lock() == IndexState::Open {
            self.dispose();
        }
    }
}
