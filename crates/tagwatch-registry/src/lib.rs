//! # Tagwatch Registry
//!
//! Docker Registry HTTP v2 client used by Tagwatch to resolve the current
//! digest of every tracked tag.
//!
//! The client speaks the standard registry wire protocol:
//!
//! 1. Unauthenticated probe of `/v2/` and, when challenged, anonymous
//!    bearer-token negotiation via the `WWW-Authenticate` header.
//! 2. Paginated tag listing (`Link` header continuation).
//! 3. Per-tag manifest fetch, following manifest-list indirection to a
//!    concrete platform manifest's digest.
//!
//! Transient failures are retried with bounded exponential backoff; every
//! failure mode surfaces as a typed [`RegistryError`] so the caller can
//! apply per-repository error policy instead of aborting a whole run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tagwatch_core::RepositoryConfig;
//! use tagwatch_registry::{RegistryClient, RegistryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RegistryConfig::new("https://mcr.microsoft.com")
//!         .with_architecture("amd64");
//!     let client = RegistryClient::new(config)?;
//!
//!     let repo = RepositoryConfig::new("windows/nanoserver");
//!     let observations = client.fetch_tag_digests(&repo).await?;
//!     for obs in observations {
//!         println!("{}:{} -> {}", obs.repo, obs.tag, obs.digest);
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod client;
mod config;
mod error;
pub mod oci;

pub use client::{RegistryClient, TagSource};
pub use config::{RegistryConfig, RetryConfig};
pub use error::RegistryError;
pub use oci::{ManifestEntry, ManifestList, Platform, TagList};
