//! Error types for igarchive-core

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive itself could not be opened; nothing was ingested.
    #[error("Failed to open archive: {0}")]
    ArchiveOpen(#[source] zip::result::ZipError),

    #[error("Failed to open archive entry '{path}': {reason}")]
    EntryOpen { path: String, reason: String },

    #[error("Malformed '{path}': {reason}")]
    MalformedSchema { path: String, reason: String },

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using Error.
pub type Result<T> = std::result::Result<T, Error>;
