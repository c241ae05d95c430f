//! Synchronous configuration surface.
//!
//! `IndexConfig` is a plain, synchronously constructible struct — no async,
//! no I/O happens while building one. It is the boundary external
//! collaborators (CLI, HTTP layer) are expected to populate before calling
//! [`crate::Index::create`] or [`crate::Index::open`].

use std::path::PathBuf;
use std::sync::Arc;

/// Where an index's data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Ephemeral, in-process database. Durable only via [`crate::Index::flush`].
    InMemory,
    /// A `index.db` file (plus `-wal`/`-shm` side files) under `storage_directory`.
    OnDisk,
}

/// A token normalization hook: `normalize(token) -> token`.
pub type LemmatizerHook = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A stop-word membership test: `is_stop_word(token) -> bool`.
pub type StopWordHook = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Configuration for opening or creating an index.
#[derive(Clone)]
pub struct IndexConfig {
    /// Logical name of the index.
    pub name: String,
    /// `in_memory` or `on_disk` — mandatory.
    pub storage_mode: StorageMode,
    /// Required iff `storage_mode == OnDisk`; the directory containing
    /// `index.db`. Created on first open if absent.
    pub storage_directory: Option<PathBuf>,
    /// Run the configured lemmatizer hook over surviving tokens. Default false.
    pub enable_lemmatizer: bool,
    /// Discard tokens found in the stop-word hook/list. Default false.
    pub enable_stop_word_removal: bool,
    /// Discard tokens strictly shorter than this. `0` disables the filter.
    pub min_token_length: usize,
    /// Discard tokens strictly longer than this. `0` disables the filter.
    pub max_token_length: usize,
    /// Optional `normalize(token) -> token` hook; identity if absent.
    pub lemmatizer_hook: Option<LemmatizerHook>,
    /// Optional `is_stop_word(token) -> bool` hook; overrides the built-in
    /// English list if present.
    pub stop_word_hook: Option<StopWordHook>,
}

impl IndexConfig {
    /// An in-memory index with every analyzer toggle at its default.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_mode: StorageMode::InMemory,
            storage_directory: None,
            enable_lemmatizer: false,
            enable_stop_word_removal: false,
            min_token_length: 0,
            max_token_length: 0,
            lemmatizer_hook: None,
            stop_word_hook: None,
        }
    }

    /// An on-disk index rooted at `directory`.
    pub fn on_disk(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            storage_mode: StorageMode::OnDisk,
            storage_directory: Some(directory.into()),
            enable_lemmatizer: false,
            enable_stop_word_removal: false,
            min_token_length: 0,
            max_token_length: 0,
            lemmatizer_hook: None,
            stop_word_hook: None,
        }
    }

    pub(crate) fn db_path(&self) -> Option<PathBuf> {
        self.storage_directory.as_ref().map(|dir| dir.join("index.db"))
    }
}

impl std::fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexConfig")
            .field("name", &self.name)
            .field("storage_mode", &self.storage_mode)
            .field("storage_directory", &self.storage_directory)
            .field("enable_lemmatizer", &self.enable_lemmatizer)
            .field("enable_stop_word_removal", &self.enable_stop_word_removal)
            .field("min_token_length", &self.min_token_length)
            .field("max_token_length", &self.max_token_length)
            .field("lemmatizer_hook", &self.lemmatizer_hook.is_some())
            .field("stop_word_hook", &self.stop_word_hook.is_some())
            .finish()
    }
}
