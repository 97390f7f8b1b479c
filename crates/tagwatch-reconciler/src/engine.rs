//! Core reconciliation engine.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;

use tagwatch_core::{ChangeEvent, RepositoryConfig, State, TagObservation};
use tagwatch_registry::{RegistryError, TagSource};

use crate::config::ReconcileConfig;

/// Result of one reconciliation run.
#[derive(Debug)]
pub struct ReconcileOutcome {
    /// Detected changes, in configured repository order, then tag order.
    pub changes: Vec<ChangeEvent>,

    /// The fresh state to persist, with failed repositories carried over
    /// from the prior state.
    pub state: State,

    /// Fetch failures, keyed by repository name.
    pub errors: BTreeMap<String, RegistryError>,
}

impl ReconcileOutcome {
    /// Returns true when every repository was fetched successfully.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compares current registry observations against a prior state.
///
/// Generic over the tag source so tests can drive it with a scripted
/// source instead of a live registry.
pub struct Reconciler<S> {
    source: S,
    config: ReconcileConfig,
}

impl<S: TagSource> Reconciler<S> {
    /// Creates a reconciler over the given tag source.
    pub fn new(source: S, config: ReconcileConfig) -> Self {
        Self { source, config }
    }

    /// Fetches every configured repository and diffs the observations
    /// against the prior state.
    ///
    /// Fetches run concurrently up to the configured limit; results are
    /// reassembled into configured repository order before diffing, so
    /// the outcome is deterministic regardless of completion order.
    ///
    /// This never fails as a whole: per-repository errors land in
    /// [`ReconcileOutcome::errors`] and the affected repositories keep
    /// their prior state entries.
    pub async fn reconcile(&self, repos: &[RepositoryConfig], prior: &State) -> ReconcileOutcome {
        let deadline = self.config.deadline.map(|d| Instant::now() + d);

        let mut results: Vec<(usize, Result<Vec<TagObservation>, RegistryError>)> =
            stream::iter(repos.iter().enumerate())
                .map(|(index, repo)| {
                    let source = &self.source;
                    async move { (index, fetch_one(source, repo, deadline).await) }
                })
                .buffer_unordered(self.config.max_concurrent)
                .collect()
                .await;
        results.sort_unstable_by_key(|(index, _)| *index);

        let mut state = State::default();
        let mut changes = Vec::new();
        let mut errors = BTreeMap::new();

        for (index, result) in results {
            let repo = &repos[index];
            match result {
                Ok(observations) => {
                    let mut tags = BTreeMap::new();
                    for observation in &observations {
                        match prior.digest(&repo.name, &observation.tag) {
                            None => changes.push(ChangeEvent::new_tag(observation)),
                            Some(previous) if previous != observation.digest => {
                                changes.push(ChangeEvent::updated_tag(observation, previous));
                            }
                            Some(_) => {}
                        }
                        tags.insert(observation.tag.clone(), observation.digest.clone());
                    }
                    tracing::debug!(
                        repo = %repo.name,
                        tags = tags.len(),
                        "repository reconciled"
                    );
                    state.replace_repo(repo.name.clone(), tags);
                }
                Err(e) => {
                    tracing::warn!(
                        repo = %repo.name,
                        error = %e,
                        "fetch failed, carrying prior entries forward"
                    );
                    state.carry_repo_from(prior, &repo.name);
                    errors.insert(repo.name.clone(), e);
                }
            }
        }

        state.touch();
        tracing::info!(
            repos = repos.len(),
            changes = changes.len(),
            failed = errors.len(),
            "reconciliation complete"
        );

        ReconcileOutcome {
            changes,
            state,
            errors,
        }
    }
}

async fn fetch_one<S: TagSource>(
    source: &S,
    repo: &RepositoryConfig,
    deadline: Option<Instant>,
) -> Result<Vec<TagObservation>, RegistryError> {
    match deadline {
        Some(at) => match tokio::time::timeout_at(at, source.fetch_tag_digests(repo)).await {
            Ok(result) => result,
            Err(_) => Err(RegistryError::DeadlineExceeded {
                repo: repo.name.clone(),
            }),
        },
        None => source.fetch_tag_digests(repo).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use tagwatch_core::ChangeKind;

    enum Script {
        Tags(Vec<(&'static str, &'static str)>),
        Fail,
        Slow(Duration, Vec<(&'static str, &'static str)>),
    }

    struct ScriptedSource {
        scripts: HashMap<String, Script>,
    }

    impl ScriptedSource {
        fn new(scripts: Vec<(&str, Script)>) -> Self {
            Self {
                scripts: scripts
                    .into_iter()
                    .map(|(repo, script)| (repo.to_string(), script))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl TagSource for ScriptedSource {
        async fn fetch_tag_digests(
            &self,
            repo: &RepositoryConfig,
        ) -> Result<Vec<TagObservation>, RegistryError> {
            let observations = |tags: &[(&str, &str)]| {
                tags.iter()
                    .map(|(tag, digest)| TagObservation::new(&repo.name, *tag, *digest))
                    .collect()
            };

            match self.scripts.get(&repo.name) {
                Some(Script::Tags(tags)) => Ok(observations(tags)),
                Some(Script::Slow(delay, tags)) => {
                    tokio::time::sleep(*delay).await;
                    Ok(observations(tags))
                }
                Some(Script::Fail) => Err(RegistryError::HttpError {
                    status: 500,
                    message: "scripted failure".to_string(),
                }),
                None => Ok(Vec::new()),
            }
        }
    }

    fn repo(name: &str) -> RepositoryConfig {
        RepositoryConfig::new(name)
    }

    #[tokio::test]
    async fn first_run_reports_every_tag_as_new() {
        let source = ScriptedSource::new(vec![(
            "windows/servercore",
            Script::Tags(vec![("ltsc2019", "sha256:a"), ("ltsc2022", "sha256:b")]),
        )]);
        let reconciler = Reconciler::new(source, ReconcileConfig::default());

        let outcome = reconciler
            .reconcile(&[repo("windows/servercore")], &State::default())
            .await;

        assert!(outcome.is_clean());
        assert_eq!(outcome.changes.len(), 2);
        assert!(outcome
            .changes
            .iter()
            .all(|c| c.kind == ChangeKind::New && c.previous_digest.is_none()));
        assert_eq!(
            outcome.state.digest("windows/servercore", "ltsc2022"),
            Some("sha256:b")
        );
    }

    #[tokio::test]
    async fn changed_digest_reports_updated_with_previous() {
        let mut prior = State::default();
        prior.record(&TagObservation::new("repo", "latest", "sha256:old"));

        let source = ScriptedSource::new(vec![(
            "repo",
            Script::Tags(vec![("latest", "sha256:new")]),
        )]);
        let reconciler = Reconciler::new(source, ReconcileConfig::default());

        let outcome = reconciler.reconcile(&[repo("repo")], &prior).await;

        assert_eq!(outcome.changes.len(), 1);
        let change = &outcome.changes[0];
        assert_eq!(change.kind, ChangeKind::Updated);
        assert_eq!(change.digest, "sha256:new");
        assert_eq!(change.previous_digest.as_deref(), Some("sha256:old"));
    }

    #[tokio::test]
    async fn unchanged_digests_produce_no_events() {
        let source = ScriptedSource::new(vec![(
            "repo",
            Script::Tags(vec![("latest", "sha256:same")]),
        )]);
        let reconciler = Reconciler::new(source, ReconcileConfig::default());

        let first = reconciler.reconcile(&[repo("repo")], &State::default()).await;
        assert_eq!(first.changes.len(), 1);

        let second = reconciler.reconcile(&[repo("repo")], &first.state).await;
        assert!(second.changes.is_empty());
        assert_eq!(second.state.repos, first.state.repos);
    }

    #[tokio::test]
    async fn failed_repo_keeps_prior_entries_and_is_reported() {
        let mut prior = State::default();
        prior.record(&TagObservation::new("broken", "v1", "sha256:keep"));

        let source = ScriptedSource::new(vec![
            ("broken", Script::Fail),
            ("healthy", Script::Tags(vec![("v2", "sha256:new")])),
        ]);
        let reconciler = Reconciler::new(source, ReconcileConfig::default());

        let outcome = reconciler
            .reconcile(&[repo("broken"), repo("healthy")], &prior)
            .await;

        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors.contains_key("broken"));
        // The failure must not look like a tag removal.
        assert_eq!(outcome.state.digest("broken", "v1"), Some("sha256:keep"));
        // The healthy repo still produced its change.
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].repo, "healthy");
    }

    #[tokio::test]
    async fn disappeared_tags_leave_state_without_events() {
        let mut prior = State::default();
        prior.record(&TagObservation::new("repo", "gone", "sha256:old"));
        prior.record(&TagObservation::new("repo", "kept", "sha256:same"));

        let source = ScriptedSource::new(vec![(
            "repo",
            Script::Tags(vec![("kept", "sha256:same")]),
        )]);
        let reconciler = Reconciler::new(source, ReconcileConfig::default());

        let outcome = reconciler.reconcile(&[repo("repo")], &prior).await;

        assert!(outcome.changes.is_empty());
        assert_eq!(outcome.state.digest("repo", "gone"), None);
        assert_eq!(outcome.state.digest("repo", "kept"), Some("sha256:same"));
    }

    #[tokio::test(start_paused = true)]
    async fn events_follow_configured_order_despite_completion_order() {
        // The first repo finishes last; its events must still come first.
        let source = ScriptedSource::new(vec![
            (
                "a/first",
                Script::Slow(Duration::from_millis(50), vec![("t", "sha256:1")]),
            ),
            ("b/second", Script::Tags(vec![("t", "sha256:2")])),
            ("c/third", Script::Tags(vec![("t", "sha256:3")])),
        ]);
        let reconciler = Reconciler::new(
            source,
            ReconcileConfig::default().with_max_concurrent(3),
        );

        let outcome = reconciler
            .reconcile(
                &[repo("a/first"), repo("b/second"), repo("c/third")],
                &State::default(),
            )
            .await;

        let order: Vec<_> = outcome.changes.iter().map(|c| c.repo.as_str()).collect();
        assert_eq!(order, vec!["a/first", "b/second", "c/third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_marks_unfinished_repos_as_failed() {
        let mut prior = State::default();
        prior.record(&TagObservation::new("slow", "v1", "sha256:keep"));

        let source = ScriptedSource::new(vec![
            (
                "slow",
                Script::Slow(Duration::from_secs(60), vec![("v1", "sha256:never")]),
            ),
            ("fast", Script::Tags(vec![("v1", "sha256:done")])),
        ]);
        let reconciler = Reconciler::new(
            source,
            ReconcileConfig::default().with_deadline(Duration::from_secs(1)),
        );

        let outcome = reconciler
            .reconcile(&[repo("slow"), repo("fast")], &prior)
            .await;

        assert!(matches!(
            outcome.errors.get("slow"),
            Some(RegistryError::DeadlineExceeded { .. })
        ));
        assert_eq!(outcome.state.digest("slow", "v1"), Some("sha256:keep"));
        assert_eq!(outcome.state.digest("fast", "v1"), Some("sha256:done"));
    }

    #[tokio::test]
    async fn reconcile_stamps_last_checked() {
        let source = ScriptedSource::new(vec![]);
        let reconciler = Reconciler::new(source, ReconcileConfig::default());

        let outcome = reconciler.reconcile(&[], &State::default()).await;
        assert!(outcome.state.last_checked.is_some());
    }
}
