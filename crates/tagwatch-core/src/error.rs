//! Error types for configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the watch configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file does not exist.
    #[error("config file not found: {path}")]
    NotFound {
        /// Path that was probed.
        path: PathBuf,
    },

    /// Configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON or does not match the schema.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration parsed but is semantically invalid.
    #[error("invalid config: {reason}")]
    Invalid {
        /// Reason for invalidity.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ConfigError::NotFound {
            path: PathBuf::from("config.json"),
        };
        assert_eq!(err.to_string(), "config file not found: config.json");
    }

    #[test]
    fn test_invalid_display() {
        let err = ConfigError::Invalid {
            reason: "'repos' must not be empty".to_string(),
        };
        assert!(err.to_string().contains("'repos' must not be empty"));
    }
}
