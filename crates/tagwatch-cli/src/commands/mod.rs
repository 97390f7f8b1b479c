//! CLI commands and argument parsing.

pub mod check;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tagwatch_store::{FileStore, S3Config, S3Store, StateStore};

/// Tagwatch - container registry tag monitor
#[derive(Parser)]
#[command(name = "tagwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Poll the registry and report tag changes since the last run
    Check(check::CheckArgs),

    /// Print the persisted state
    State(state::StateArgs),

    /// Print version information
    Version,
}

/// State backend selection, shared by every command that touches state.
#[derive(Args)]
pub struct StoreArgs {
    /// State backend: local, s3
    #[arg(long, env = "TAGWATCH_STATE_BACKEND", default_value = "local")]
    pub backend: String,

    /// State file path (local backend)
    #[arg(long, env = "TAGWATCH_STATE_FILE", default_value = "tagwatch_state.json")]
    pub state_file: PathBuf,

    /// S3 bucket holding the state object (s3 backend)
    #[arg(long, env = "S3_BUCKET")]
    pub bucket: Option<String>,

    /// S3 object key of the state document (s3 backend)
    #[arg(long, env = "STATE_KEY", default_value = "tagwatch_state.json")]
    pub key: String,

    /// AWS region (s3 backend)
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Custom S3 endpoint URL, for S3-compatible storage (s3 backend)
    #[arg(long, env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,
}

impl StoreArgs {
    /// Builds the selected state store.
    pub async fn build_store(&self) -> Result<Arc<dyn StateStore>> {
        match self.backend.to_lowercase().as_str() {
            "local" => Ok(Arc::new(FileStore::new(&self.state_file))),
            "s3" => {
                let bucket = self.bucket.as_ref().ok_or_else(|| {
                    anyhow::anyhow!("the s3 backend requires --bucket (or S3_BUCKET)")
                })?;

                let mut config = S3Config::new(bucket, &self.key);
                if let Some(region) = &self.region {
                    config = config.with_region(region);
                }
                if let Some(endpoint) = &self.endpoint {
                    config = config.with_endpoint(endpoint);
                }

                Ok(Arc::new(S3Store::new(config).await))
            }
            other => anyhow::bail!("Unknown state backend '{other}'. Use: local or s3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[tokio::test]
    async fn test_local_backend_is_default() {
        let args = StoreArgs {
            backend: "local".to_string(),
            state_file: PathBuf::from("tagwatch_state.json"),
            bucket: None,
            key: "tagwatch_state.json".to_string(),
            region: None,
            endpoint: None,
        };
        assert!(args.build_store().await.is_ok());
    }

    #[tokio::test]
    async fn test_s3_backend_requires_bucket() {
        let args = StoreArgs {
            backend: "s3".to_string(),
            state_file: PathBuf::from("tagwatch_state.json"),
            bucket: None,
            key: "tagwatch_state.json".to_string(),
            region: None,
            endpoint: None,
        };
        let result = args.build_store().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unknown_backend_is_rejected() {
        let args = StoreArgs {
            backend: "redis".to_string(),
            state_file: PathBuf::from("tagwatch_state.json"),
            bucket: None,
            key: "tagwatch_state.json".to_string(),
            region: None,
            endpoint: None,
        };
        let result = args.build_store().await;
        assert!(result.is_err());
    }
}
