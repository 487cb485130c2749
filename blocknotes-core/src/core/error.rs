//! Error types for the Blocknotes core library.

use thiserror::Error;

/// All errors that can occur within the Blocknotes core library.
#[derive(Debug, Error)]
pub enum BlocknotesError {
    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A write would exceed the storage quota of the backend.
    #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, quota is {quota}")]
    StorageFull {
        key: String,
        needed: usize,
        quota: usize,
    },

    /// The backend refused a write for another reason.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The opened file is not a valid Blocknotes store.
    #[error("Invalid store: {0}")]
    InvalidStore(String),

    /// A storage slot holds data that cannot be parsed.
    #[error("Corrupt data in slot '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// An import document was rejected before anything was written.
    #[error("Invalid import: {0}")]
    InvalidImport(String),

    /// A move operation would create a cycle or is otherwise invalid.
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Data could not be serialized to or deserialized from JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias that pins the error type to [`BlocknotesError`].
pub type Result<T> = std::result::Result<T, BlocknotesError>;

impl BlocknotesError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Failed to save: {e}"),
            Self::StorageFull { .. } => {
                "Storage is full, delete some pages or export a backup".to_string()
            }
            Self::Storage(e) => format!("Failed to save: {e}"),
            Self::InvalidStore(_) => "Could not open the notes store".to_string(),
            Self::Corrupt { key, .. } => format!("Saved data in '{key}' is damaged"),
            Self::InvalidImport(msg) => format!("Import failed: {msg}"),
            Self::InvalidMove(msg) => msg.clone(),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }
}
