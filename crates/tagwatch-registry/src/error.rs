//! Error types for registry operations.

use thiserror::Error;

/// Errors that can occur while fetching tags and digests.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to connect to the registry.
    #[error("failed to reach registry at {url}: {source}")]
    ConnectionFailed {
        /// Registry URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Anonymous token acquisition failed.
    #[error("token acquisition failed for '{repo}': {message}")]
    AuthenticationFailed {
        /// Repository the token was scoped to.
        repo: String,
        /// Error message.
        message: String,
    },

    /// The repository does not exist on the registry.
    #[error("repository not found: {repo}")]
    RepositoryNotFound {
        /// Repository name.
        repo: String,
    },

    /// Non-retryable HTTP error from the registry.
    #[error("registry returned {status}: {message}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// Transient failures persisted through every retry attempt.
    #[error("fetch for '{repo}' failed after {attempts} attempts: {message}")]
    RetriesExhausted {
        /// Repository name.
        repo: String,
        /// Number of attempts made.
        attempts: u32,
        /// Last observed error.
        message: String,
    },

    /// A manifest list contained no entry for the target platform.
    #[error("manifest list for {repo}:{tag} resolved without match (architecture: {})", architecture.as_deref().unwrap_or("any"))]
    ManifestListUnresolved {
        /// Repository name.
        repo: String,
        /// Tag name.
        tag: String,
        /// Architecture that was requested, if any.
        architecture: Option<String>,
    },

    /// The overall run deadline expired before this repository was fetched.
    #[error("fetch for '{repo}' exceeded the run deadline")]
    DeadlineExceeded {
        /// Repository name.
        repo: String,
    },

    /// A registry response body could not be decoded.
    #[error("failed to decode registry response: {message}")]
    DecodeError {
        /// Error message.
        message: String,
    },

    /// The configured registry URL is invalid.
    #[error("invalid registry URL: {url}")]
    InvalidUrl {
        /// URL string.
        url: String,
    },
}

impl RegistryError {
    /// Returns true if retrying the request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } => true,
            Self::HttpError { status, .. } => *status >= 500 || *status == 0,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::ConnectionFailed {
                url: err
                    .url()
                    .map_or_else(|| "unknown".to_string(), ToString::to_string),
                source: err,
            }
        } else if err.is_decode() {
            Self::DecodeError {
                message: err.to_string(),
            }
        } else {
            let status = err.status().map_or(0, |s| s.as_u16());
            Self::HttpError {
                status,
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = RegistryError::RepositoryNotFound {
            repo: "windows/servercore".to_string(),
        };
        assert_eq!(err.to_string(), "repository not found: windows/servercore");
    }

    #[test]
    fn test_manifest_list_unresolved_display() {
        let err = RegistryError::ManifestListUnresolved {
            repo: "windows/nanoserver".to_string(),
            tag: "latest".to_string(),
            architecture: Some("amd64".to_string()),
        };
        assert!(err.to_string().contains("resolved without match"));
        assert!(err.to_string().contains("amd64"));
    }

    #[test]
    fn test_server_errors_are_retryable() {
        let err = RegistryError::HttpError {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let err = RegistryError::HttpError {
            status: 403,
            message: "forbidden".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_auth_failure_not_retryable() {
        let err = RegistryError::AuthenticationFailed {
            repo: "r".to_string(),
            message: "no token in response".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_deadline_not_retryable() {
        let err = RegistryError::DeadlineExceeded {
            repo: "r".to_string(),
        };
        assert!(!err.is_retryable());
    }
}
