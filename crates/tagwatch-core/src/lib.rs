//! # Tagwatch Core
//!
//! Core types for tracking container-image tags across registry polling runs.
//!
//! This crate provides the foundational data structures used throughout the
//! Tagwatch workspace, including:
//!
//! - [`RepositoryConfig`] - A repository to track and its tag patterns
//! - [`TagObservation`] - A single observed (repo, tag, digest) triple
//! - [`State`] - The persisted mapping of last-observed digests
//! - [`ChangeEvent`] - A detected new or updated tag
//! - [`pattern`] - Wildcard tag matching (`*` as zero-or-more characters)
//! - [`WatchConfig`] - Configuration-file parsing and normalization
//!
//! ## Example
//!
//! ```rust
//! use tagwatch_core::{pattern, RepositoryConfig, State};
//!
//! let repo = RepositoryConfig::new("windows/servercore")
//!     .with_patterns(vec!["ltsc2022-*".to_string()]);
//!
//! assert!(pattern::matches("ltsc2022-amd64", &repo.tag_patterns));
//! assert!(!pattern::matches("windows-ltsc2022-amd64", &repo.tag_patterns));
//!
//! let state = State::default();
//! assert!(state.is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod model;
pub mod pattern;


// Re-export main types at crate root
pub use config::{RepoEntry, WatchConfig};
pub use error::ConfigError;
pub use model::{ChangeEvent, ChangeKind, RepositoryConfig, State, TagObservation};
