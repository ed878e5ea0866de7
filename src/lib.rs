//! # Songlib - song library service
//!
//! Stores songs (group, name, release link, release date) together with their
//! lyrics split into numbered verses, and enriches newly added songs through
//! an external metadata lookup before persisting.
//!
//! Songlib provides:
//! - A SQLite-backed song repository with atomic song+verses writes
//! - A pure query builder for filtered listing and partial updates
//! - A versioned migration runner applied at store construction
//! - An HTTP API (axum) plus a CLI for serving and inspecting the library

pub mod config;
pub mod external;
pub mod server;
pub mod service;
pub mod song;
pub mod storage;

// Re-exports for convenient access
pub use service::SongService;
pub use song::{NewSong, Song, SongUpdate, Verse};
pub use storage::SqliteStore;

/// Result type alias for Songlib operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Songlib operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection could not be used or the store did not respond.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A single-entity lookup missed.
    #[error("song {0} not found")]
    NotFound(i64),

    /// Missing required field, invalid foreign key, or failed unique constraint.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// An update request carrying zero scalar fields and zero verse edits.
    #[error("no fields to update")]
    NoFieldsToUpdate,

    /// Commit or rollback itself failed; fatal for the request, never retried.
    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    /// The external metadata lookup failed or returned an unusable body.
    #[error("external API: {0}")]
    External(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::ConstraintViolation(err.to_string())
            }
            _ => Error::StoreUnavailable(err.to_string()),
        }
    }
}
