use std::fmt;

/// Result type for buildtrace-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the types layer
#[derive(Debug)]
pub enum Error {
    /// Unrecognized run status string
    InvalidRunStatus(String),

    /// Unrecognized cache status string
    InvalidCacheStatus(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRunStatus(value) => write!(f, "Invalid run status: '{}'", value),
            Error::InvalidCacheStatus(value) => write!(f, "Invalid cache status: '{}'", value),
        }
    }
}

impl std::error::Error for Error {}
