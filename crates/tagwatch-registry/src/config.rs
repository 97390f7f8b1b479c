//! Configuration types for the registry client.

use std::time::Duration;

/// Configuration for the registry client.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry base URL (e.g., "<https://mcr.microsoft.com>").
    pub url: String,

    /// Target platform architecture used to resolve manifest lists
    /// (e.g., "amd64"). When unset, the first list entry is selected.
    pub architecture: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Page size requested on the tag-list endpoint.
    pub page_size: u32,

    /// Retry policy for transient failures.
    pub retry: RetryConfig,

    /// User agent string.
    pub user_agent: String,
}

impl RegistryConfig {
    /// Creates a new configuration with the given registry URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagwatch_registry::RegistryConfig;
    ///
    /// let config = RegistryConfig::new("https://mcr.microsoft.com");
    /// assert_eq!(config.url, "https://mcr.microsoft.com");
    /// ```
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let mut url = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        Self {
            url,
            architecture: None,
            timeout: Duration::from_secs(30),
            page_size: 100,
            retry: RetryConfig::default(),
            user_agent: format!("tagwatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the target platform architecture.
    #[must_use]
    pub fn with_architecture(mut self, architecture: impl Into<String>) -> Self {
        self.architecture = Some(architecture.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the tag-list page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Retry policy for transient registry failures.
///
/// Backoff doubles after every failed attempt, capped at `max_backoff`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,

    /// Backoff before the second attempt.
    pub initial_backoff: Duration,

    /// Ceiling for the exponential backoff.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Sets the maximum attempt count.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the initial backoff.
    #[must_use]
    pub const fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Sets the backoff ceiling.
    #[must_use]
    pub const fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }
}
