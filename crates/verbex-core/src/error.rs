//! Error taxonomy for the storage and query engine.
//!
//! Every fallible public operation returns [`Result<T>`]. Mutations are
//! transactional: any error raised inside a write transaction rolls the
//! transaction back, so the six tables never observe a partial write.

/// Errors raised by the storage, indexing, and query layers.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A lookup (document, term, tag, label) found nothing.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// The id or key that was searched for.
        id: String,
    },

    /// A uniqueness constraint was violated (document name, index name).
    #[error("{entity} already exists: {key}")]
    AlreadyExists {
        /// Kind of entity that collided.
        entity: &'static str,
        /// The key that already existed.
        key: String,
    },

    /// An operation other than `open`/`dispose` was called before `open`.
    #[error("index is not open")]
    NotOpen,

    /// `open` was called on an index that is already open.
    #[error("index is already open")]
    AlreadyOpen,

    /// A caller-supplied argument failed validation.
    #[error("invalid argument `{field}`: {reason}")]
    InvalidArgument {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable reason the value was rejected.
        reason: String,
    },

    /// The operation's cancellation signal fired.
    #[error("operation cancelled")]
    Cancelled,

    /// A lock or busy-timeout wait exceeded its deadline.
    #[error("storage busy: {detail}")]
    Busy {
        /// Detail about what was contended.
        detail: String,
    },

    /// A filesystem operation failed.
    #[error("io error at {path}: {cause}")]
    Io {
        /// Path the operation was attempted against.
        path: String,
        /// Underlying cause.
        #[source]
        cause: std::io::Error,
    },

    /// The on-disk schema or a stored row could not be interpreted.
    #[error("corruption detected: {detail}")]
    Corruption {
        /// Detail about what failed to deserialize or what the schema probe found.
        detail: String,
    },

    /// Catch-all for SQLite failures that don't map to a more specific variant.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn already_exists(entity: &'static str, key: impl Into<String>) -> Self {
        Error::AlreadyExists {
            entity,
            key: key.into(),
        }
    }

    pub(crate) fn invalid_argument(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}
