//! Local-file state backend.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tagwatch_core::State;

use crate::error::StoreError;
use crate::StateStore;

/// State backend persisting to a single local JSON file.
///
/// Saves go through a temporary file in the destination directory followed
/// by an atomic rename, so a crash mid-write leaves the previous document
/// untouched.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by the given file path.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagwatch_store::FileStore;
    ///
    /// let store = FileStore::new("tagwatch_state.json");
    /// assert_eq!(store.path().to_str(), Some("tagwatch_state.json"));
    /// ```
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for FileStore {
    async fn load(&self) -> Result<State, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                location: self.path.display().to_string(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no prior state file, starting empty");
                Ok(State::default())
            }
            Err(e) => Err(StoreError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    async fn save(&self, state: &State) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(state).map_err(|e| StoreError::WriteFailed {
            location: self.path.display().to_string(),
            message: format!("failed to serialize state: {e}"),
        })?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // The temp file must live in the destination directory: rename is
        // only atomic within one filesystem.
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        tmp.write_all(&json).map_err(|e| StoreError::Io {
            path: tmp.path().to_path_buf(),
            source: e,
        })?;
        tmp.as_file().sync_all().map_err(|e| StoreError::Io {
            path: tmp.path().to_path_buf(),
            source: e,
        })?;
        tmp.persist(&self.path).map_err(|e| StoreError::WriteFailed {
            location: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!(path = %self.path.display(), entries = state.len(), "state saved");
        Ok(())
    }
}
