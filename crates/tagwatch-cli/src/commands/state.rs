//! State command: print the persisted state.

use anyhow::{Context, Result};
use clap::Args;
use tagwatch_store::StateStore;

use super::StoreArgs;

/// Arguments for the state command.
#[derive(Args)]
pub struct StateArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

/// Execute the state command.
pub async fn execute(args: StateArgs) -> Result<()> {
    let store = args.store.build_store().await?;
    let state = store.load().await.context("failed to load state")?;

    if state.is_empty() {
        println!("No state recorded yet.");
        return Ok(());
    }

    if let Some(checked) = state.last_checked {
        println!("Last checked: {}", checked.to_rfc3339());
    }
    for (repo, tag, digest) in state.iter() {
        println!("{repo}:{tag} {digest}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagwatch_core::{State, TagObservation};
    use tagwatch_store::{FileStore, StateStore};

    fn local_args(state_file: std::path::PathBuf) -> StateArgs {
        StateArgs {
            store: StoreArgs {
                backend: "local".to_string(),
                state_file,
                bucket: None,
                key: "tagwatch_state.json".to_string(),
                region: None,
                endpoint: None,
            },
        }
    }

    #[tokio::test]
    async fn test_prints_persisted_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = State::default();
        state.record(&TagObservation::new("repo", "latest", "sha256:abc"));
        FileStore::new(&path).save(&state).await.unwrap();

        assert!(execute(local_args(path)).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_state_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = local_args(dir.path().join("absent.json"));
        assert!(execute(args).await.is_ok());
    }
}
