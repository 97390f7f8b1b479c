//! Check command: poll the registry and report tag changes.
//!
//! One invocation is one reconciliation run: load the watch config and the
//! prior state, fetch every configured repository, print the change report,
//! persist the fresh state.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tagwatch_core::{State, WatchConfig};
use tagwatch_reconciler::{ReconcileConfig, ReconcileOutcome, Reconciler};
use tagwatch_registry::{RegistryClient, RegistryConfig, RetryConfig};
use tagwatch_store::{StateStore, StoreError};

use super::StoreArgs;

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Watch configuration file
    #[arg(short, long, env = "TAGWATCH_CONFIG", default_value = "config.json")]
    pub config: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Maximum repositories fetched concurrently
    #[arg(long, default_value = "5")]
    pub max_concurrent: usize,

    /// Deadline for the whole run, in seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Maximum attempts per registry request
    #[arg(long, default_value = "3")]
    pub max_retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    /// Start from an empty state when the persisted one cannot be parsed
    #[arg(long)]
    pub reset_corrupt_state: bool,

    /// Exit non-zero when any repository failed to fetch
    #[arg(long)]
    pub fail_on_error: bool,
}

/// Execute the check command.
pub async fn execute(args: CheckArgs) -> Result<()> {
    let watch = WatchConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let repos = watch.repositories();

    let store = args.store.build_store().await?;
    let prior = match store.load().await {
        Ok(state) => state,
        Err(e @ StoreError::Corrupt { .. }) if args.reset_corrupt_state => {
            tracing::warn!(error = %e, "discarding corrupt state, starting empty");
            State::default()
        }
        Err(e) => return Err(e).context("failed to load state"),
    };

    let mut registry = RegistryConfig::new(&watch.registry)
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_retry(RetryConfig::default().with_max_attempts(args.max_retries));
    if let Some(architecture) = &watch.architecture {
        registry = registry.with_architecture(architecture);
    }
    let client = RegistryClient::new(registry).context("failed to create registry client")?;

    let mut reconcile = ReconcileConfig::new().with_max_concurrent(args.max_concurrent);
    if let Some(secs) = args.deadline_secs {
        reconcile = reconcile.with_deadline(Duration::from_secs(secs));
    }

    tracing::info!(
        registry = %watch.registry,
        repos = repos.len(),
        "checking for tag changes"
    );
    let outcome = Reconciler::new(client, reconcile)
        .reconcile(&repos, &prior)
        .await;

    print_report(&outcome);

    store
        .save(&outcome.state)
        .await
        .context("failed to save state")?;

    if args.fail_on_error && !outcome.is_clean() {
        anyhow::bail!("{} repositories failed to fetch", outcome.errors.len());
    }

    Ok(())
}

fn print_report(outcome: &ReconcileOutcome) {
    if outcome.changes.is_empty() {
        println!("No changes detected.");
    } else {
        for change in &outcome.changes {
            println!("{change}");
        }
    }

    if !outcome.errors.is_empty() {
        println!();
        println!("Failed repositories:");
        for (repo, error) in &outcome.errors {
            println!("  {repo}: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_check_defaults() {
        let cli = Cli::try_parse_from(["tagwatch", "check"]).unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("expected check command");
        };

        assert_eq!(args.max_concurrent, 5);
        assert_eq!(args.max_retries, 3);
        assert_eq!(args.timeout_secs, 30);
        assert!(args.deadline_secs.is_none());
        assert!(!args.reset_corrupt_state);
        assert!(!args.fail_on_error);
        assert_eq!(args.store.backend, "local");
    }

    #[test]
    fn test_check_tuning_flags() {
        let cli = Cli::try_parse_from([
            "tagwatch",
            "check",
            "--config",
            "watch.json",
            "--backend",
            "s3",
            "--bucket",
            "state-bucket",
            "--max-concurrent",
            "10",
            "--deadline-secs",
            "120",
            "--fail-on-error",
        ])
        .unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("expected check command");
        };

        assert_eq!(args.config.to_str(), Some("watch.json"));
        assert_eq!(args.store.backend, "s3");
        assert_eq!(args.store.bucket.as_deref(), Some("state-bucket"));
        assert_eq!(args.max_concurrent, 10);
        assert_eq!(args.deadline_secs, Some(120));
        assert!(args.fail_on_error);
    }
}
