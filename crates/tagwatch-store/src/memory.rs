//! In-memory state backend for tests and dry runs.

use async_trait::async_trait;
use tagwatch_core::State;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::StateStore;

/// State backend holding the document in process memory.
///
/// Nothing survives the process; useful for tests and for `--dry-run`
/// style invocations that must not touch durable state.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Option<State>>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with a state, as if a prior run had
    /// persisted it.
    #[must_use]
    pub fn seeded(state: State) -> Self {
        Self {
            state: RwLock::new(Some(state)),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<State, StoreError> {
        Ok(self.state.read().await.clone().unwrap_or_default())
    }

    async fn save(&self, state: &State) -> Result<(), StoreError> {
        *self.state.write().await = Some(state.clone());
        Ok(())
    }
}
