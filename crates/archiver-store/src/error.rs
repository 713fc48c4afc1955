//! Error types for archiver-store.

use std::path::PathBuf;

use rusqlite::ErrorCode;

/// Result type for archiver-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in archiver-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing file cannot be opened or written (missing directory,
    /// permission denied, read-only medium, disk full, not a database).
    #[error("Storage unavailable at {location}: {source}")]
    Unavailable {
        location: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Any other database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create the default database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// Classify a SQLite error raised while opening or writing the store.
    ///
    /// Errors that mean "the medium is not usable" become
    /// [`Error::Unavailable`]; everything else stays a [`Error::Database`].
    pub(crate) fn from_sqlite(location: &str, source: rusqlite::Error) -> Self {
        let unusable = matches!(
            source.sqlite_error_code(),
            Some(
                ErrorCode::CannotOpen
                    | ErrorCode::ReadOnly
                    | ErrorCode::PermissionDenied
                    | ErrorCode::DiskFull
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::NotADatabase
                    | ErrorCode::DatabaseCorrupt
            )
        );

        if unusable {
            Error::Unavailable {
                location: location.to_string(),
                source,
            }
        } else {
            Error::Database(source)
        }
    }

    /// Whether this error means the store medium itself is unusable.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable { .. } | Error::CreateDirectory { .. })
    }
}
