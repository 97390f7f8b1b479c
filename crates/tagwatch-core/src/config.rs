//! Watch configuration parsing and normalization.
//!
//! The configuration file lists repositories either as bare name strings
//! (implying "all tags") or as structured entries with explicit tag
//! patterns. Both shapes are normalized into [`RepositoryConfig`] at this
//! boundary; nothing past it sees the two-shape variant.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::RepositoryConfig;

/// Default registry polled when the config file does not name one.
pub const DEFAULT_REGISTRY: &str = "https://mcr.microsoft.com";

/// Parsed watch configuration.
///
/// # Examples
///
/// ```
/// use tagwatch_core::WatchConfig;
///
/// let config: WatchConfig = serde_json::from_str(r#"{
///     "repos": [
///         "windows/nanoserver",
///         { "name": "windows/servercore", "tags": ["ltsc2022-*"] }
///     ]
/// }"#).unwrap();
///
/// let repos = config.repositories();
/// assert_eq!(repos.len(), 2);
/// assert!(repos[0].tag_patterns.is_empty());
/// assert_eq!(repos[1].tag_patterns, vec!["ltsc2022-*".to_string()]);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Base URL of the registry to poll.
    #[serde(default = "default_registry")]
    pub registry: String,

    /// Target platform architecture used to resolve manifest lists
    /// (e.g., "amd64"). When absent the first list entry wins.
    #[serde(default)]
    pub architecture: Option<String>,

    /// Repository entries, in report order.
    pub repos: Vec<RepoEntry>,
}

fn default_registry() -> String {
    DEFAULT_REGISTRY.to_string()
}

/// A single repository entry as it appears in the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RepoEntry {
    /// Bare repository name; all tags are tracked.
    Name(String),

    /// Structured entry with explicit tag patterns.
    Detailed {
        /// Repository name.
        name: String,
        /// Tag patterns; empty means all tags.
        #[serde(default)]
        tags: Vec<String>,
    },
}

impl RepoEntry {
    /// Returns the repository name regardless of entry shape.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name,
        }
    }
}

impl WatchConfig {
    /// Loads and validates the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, not valid
    /// JSON, or lists no repositories.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Normalizes the entries into the single [`RepositoryConfig`] shape,
    /// preserving configured order.
    #[must_use]
    pub fn repositories(&self) -> Vec<RepositoryConfig> {
        self.repos
            .iter()
            .map(|entry| match entry {
                RepoEntry::Name(name) => RepositoryConfig::new(name.clone()),
                RepoEntry::Detailed { name, tags } => {
                    RepositoryConfig::new(name.clone()).with_patterns(tags.clone())
                }
            })
            .collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.repos.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "'repos' must list at least one repository".to_string(),
            });
        }

        for entry in &self.repos {
            if entry.name().is_empty() {
                return Err(ConfigError::Invalid {
                    reason: "repository name must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}
