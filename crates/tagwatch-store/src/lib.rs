//! # Tagwatch Store
//!
//! Durable persistence of the last-known tag state, behind a single
//! [`StateStore`] trait with interchangeable backends:
//!
//! - [`FileStore`] - local JSON file, replaced via temp-file + atomic rename
//! - [`S3Store`] - S3 (or S3-compatible) object, replaced in a single PUT
//! - [`MemoryStore`] - in-process store for tests and dry runs
//!
//! Every backend guarantees the same two properties: `load` on a backend
//! with no prior state returns an empty [`State`] (first-run semantics,
//! never an error), and `save` either fully replaces the readable state or
//! leaves the previous one intact — a partially written document is never
//! observable by a subsequent `load`.
//!
//! Backend selection is a deployment concern; the reconciling caller only
//! ever sees `Arc<dyn StateStore>`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod s3;

use async_trait::async_trait;
use tagwatch_core::State;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use s3::{S3Config, S3Store};

/// Durable storage of the last-known state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads the previously persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] when a state document exists but
    /// cannot be parsed; "no state yet" is an empty state, not an error.
    async fn load(&self) -> Result<State, StoreError>;

    /// Persists the state, fully replacing the previous document.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend rejected or could not complete
    /// the write; the previously readable state remains intact.
    async fn save(&self, state: &State) -> Result<(), StoreError>;
}
