//! Error types for state persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A state document exists but could not be parsed.
    ///
    /// Callers must not silently treat this as an empty state: doing so
    /// would re-report every tracked tag as new on the next run.
    #[error("state at {location} is corrupt: {message}")]
    Corrupt {
        /// Backend location (file path or object URL).
        location: String,
        /// Parse error detail.
        message: String,
    },

    /// The backend failed to read an existing state document.
    #[error("failed to read state from {location}: {message}")]
    ReadFailed {
        /// Backend location.
        location: String,
        /// Error detail.
        message: String,
    },

    /// The backend rejected or could not complete a save.
    #[error("failed to write state to {location}: {message}")]
    WriteFailed {
        /// Backend location.
        location: String,
        /// Error detail.
        message: String,
    },

    /// Local filesystem I/O error.
    #[error("state I/O error at {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_display() {
        let err = StoreError::Corrupt {
            location: "/var/lib/tagwatch/state.json".to_string(),
            message: "expected value at line 1".to_string(),
        };
        assert!(err.to_string().contains("is corrupt"));
        assert!(err.to_string().contains("/var/lib/tagwatch/state.json"));
    }

    #[test]
    fn test_write_failed_display() {
        let err = StoreError::WriteFailed {
            location: "s3://bucket/state.json".to_string(),
            message: "access denied".to_string(),
        };
        assert!(err.to_string().contains("s3://bucket/state.json"));
        assert!(err.to_string().contains("access denied"));
    }
}
