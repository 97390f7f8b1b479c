//! # Tagwatch Reconciler
//!
//! Turns per-repository tag observations into change events by comparing
//! them against the last persisted [`State`](tagwatch_core::State).
//!
//! The reconciler fetches repositories concurrently through any
//! [`TagSource`](tagwatch_registry::TagSource), bounded by a concurrency
//! limit and an optional whole-run deadline. A failed repository never
//! poisons the run: its prior entries are carried forward unchanged and
//! the failure is reported alongside the changes of every repository
//! that succeeded.
//!
//! Output ordering is deterministic regardless of which fetch finishes
//! first: events follow the configured repository order, then tag order
//! within a repository.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;

pub use config::ReconcileConfig;
pub use engine::{ReconcileOutcome, Reconciler};
