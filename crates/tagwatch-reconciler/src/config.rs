//! Reconciliation run configuration.

use std::time::Duration;

/// Configuration for a reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Maximum repositories fetched concurrently.
    pub max_concurrent: usize,

    /// Deadline for the whole run. Repositories still unfinished when it
    /// expires are reported as failed, never silently omitted.
    pub deadline: Option<Duration>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            deadline: None,
        }
    }
}

impl ReconcileConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of concurrent repository fetches.
    ///
    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Sets a deadline for the whole run.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
