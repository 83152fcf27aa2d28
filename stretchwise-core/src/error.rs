//! Error types for stretchwise-core

use thiserror::Error;

/// Main error type for the stretchwise-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error from the flat-file store
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Stretch not found
    #[error("stretch not found: {0}")]
    NotFound(i64),

    /// Another stretch already uses this name
    #[error("a stretch named '{0}' already exists")]
    DuplicateName(String),

    /// One or more field-level validation failures, reported together
    #[error("validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    /// A preference value was rejected
    #[error("invalid preference {name}: {reason}")]
    InvalidPreference { name: &'static str, reason: String },
}

impl Error {
    /// Whether this error came from the persistence layer (I/O, SQLite, JSON).
    ///
    /// The core never masks these; callers get them as-is.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Io(_) | Error::Json(_))
    }
}

/// Result type alias for stretchwise-core
pub type Result<T> = std::result::Result<T, Error>;
