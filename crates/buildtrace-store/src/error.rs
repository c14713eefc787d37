use std::fmt;

/// Result type for buildtrace-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the store layer.
///
/// Every operation either fully applies or surfaces one of these
/// synchronously; the store never retries and never coerces input.
#[derive(Debug)]
pub enum Error {
    /// A required field was missing or malformed
    Validation(String),

    /// An inserted row referenced an id that does not exist
    ForeignKey(String),

    /// An update targeted an id with no matching row
    NotFound { entity: &'static str, id: i64 },

    /// An update targeted a row that is already closed
    Conflict(String),

    /// The database stayed locked past the busy timeout
    Timeout,

    /// Database operation failed
    Database(rusqlite::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// A config snapshot field could not be (de)serialized
    Serialization(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
            Error::ForeignKey(msg) => write!(f, "Foreign key error: {}", msg),
            Error::NotFound { entity, id } => write!(f, "No {} with id {}", entity, id),
            Error::Conflict(msg) => write!(f, "Conflict: {}", msg),
            Error::Timeout => write!(f, "Database locked: busy timeout exceeded"),
            Error::Database(err) => write!(f, "Database error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Serialization(err) => write!(f, "Serialization error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
                    Error::ForeignKey(
                        msg.clone()
                            .unwrap_or_else(|| "FOREIGN KEY constraint failed".to_string()),
                    )
                } else {
                    match code.code {
                        rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                            Error::Timeout
                        }
                        _ => Error::Database(err),
                    }
                }
            }
            _ => Error::Database(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err)
    }
}
