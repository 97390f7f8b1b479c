//! Data model for registry tag tracking.
//!
//! These types flow between the registry client, the reconciler, and the
//! state stores. The persisted [`State`] is the only type with a wire
//! format; everything else lives in memory for the duration of a run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository to track, together with its configured tag patterns.
///
/// Immutable for the duration of a run. An empty pattern list means
/// "match every tag".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Repository name (e.g., "windows/servercore").
    pub name: String,

    /// Ordered wildcard patterns; a tag matches if any pattern matches.
    pub tag_patterns: Vec<String>,
}

impl RepositoryConfig {
    /// Creates a configuration that tracks every tag of the repository.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagwatch_core::RepositoryConfig;
    ///
    /// let repo = RepositoryConfig::new("windows/nanoserver");
    /// assert!(repo.tag_patterns.is_empty());
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag_patterns: Vec::new(),
        }
    }

    /// Sets the tag patterns.
    #[must_use]
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        self.tag_patterns = patterns;
        self
    }
}

/// A single observed (repository, tag, digest) triple.
///
/// The digest is the registry's canonical content identifier (e.g.,
/// `sha256:<hex>`) and is treated as an opaque, case-sensitive string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagObservation {
    /// Repository name.
    pub repo: String,

    /// Tag name.
    pub tag: String,

    /// Content digest the tag currently points at.
    pub digest: String,
}

impl TagObservation {
    /// Creates a new observation.
    #[must_use]
    pub fn new(
        repo: impl Into<String>,
        tag: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            repo: repo.into(),
            tag: tag.into(),
            digest: digest.into(),
        }
    }
}

/// Kind of change detected for a (repo, tag) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The key was absent from the prior state.
    New,

    /// The key was present with a different digest.
    Updated,
}

/// A detected change for a single (repo, tag) key.
///
/// Tags that disappear from a repository do not produce events; removal
/// tracking is out of scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Kind of change.
    pub kind: ChangeKind,

    /// Repository name.
    pub repo: String,

    /// Tag name.
    pub tag: String,

    /// Newly observed digest.
    pub digest: String,

    /// Digest recorded in the prior state, present for [`ChangeKind::Updated`].
    pub previous_digest: Option<String>,
}

impl ChangeEvent {
    /// Creates an event for a key absent from the prior state.
    #[must_use]
    pub fn new_tag(observation: &TagObservation) -> Self {
        Self {
            kind: ChangeKind::New,
            repo: observation.repo.clone(),
            tag: observation.tag.clone(),
            digest: observation.digest.clone(),
            previous_digest: None,
        }
    }

    /// Creates an event for a key whose digest changed.
    #[must_use]
    pub fn updated_tag(observation: &TagObservation, previous_digest: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Updated,
            repo: observation.repo.clone(),
            tag: observation.tag.clone(),
            digest: observation.digest.clone(),
            previous_digest: Some(previous_digest.into()),
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ChangeKind::New => {
                write!(f, "[NEW] {}:{} digest={}", self.repo, self.tag, self.digest)
            }
            ChangeKind::Updated => write!(
                f,
                "[UPDATED] {}:{} digest={} (was {})",
                self.repo,
                self.tag,
                self.digest,
                self.previous_digest.as_deref().unwrap_or("unknown")
            ),
        }
    }
}

/// Persisted mapping of last-observed digests per (repository, tag) key.
///
/// The state is created empty on the first run, fully replaced at the end
/// of every successful run, and never merged in place: the reconciler
/// always builds a fresh `State` from the current observation set.
///
/// Wire format is a single JSON document; unknown extra fields in a loaded
/// document are ignored, never fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// When the state was last written, RFC 3339 UTC. Absent on an
    /// empty first-run state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,

    /// Digest per tag, per repository. `BTreeMap` keeps the serialized
    /// document deterministic.
    #[serde(default)]
    pub repos: BTreeMap<String, BTreeMap<String, String>>,
}

impl State {
    /// Returns the recorded digest for a (repo, tag) key, if any.
    #[must_use]
    pub fn digest(&self, repo: &str, tag: &str) -> Option<&str> {
        self.repos.get(repo)?.get(tag).map(String::as_str)
    }

    /// Records an observation, replacing any previous digest for the key.
    pub fn record(&mut self, observation: &TagObservation) {
        self.repos
            .entry(observation.repo.clone())
            .or_default()
            .insert(observation.tag.clone(), observation.digest.clone());
    }

    /// Replaces a repository's entries with a fresh tag -> digest mapping.
    ///
    /// Tags absent from `tags` are dropped, which is how disappeared tags
    /// leave the state after a successful fetch.
    pub fn replace_repo(&mut self, repo: impl Into<String>, tags: BTreeMap<String, String>) {
        self.repos.insert(repo.into(), tags);
    }

    /// Copies a repository's entries unchanged from another state.
    ///
    /// Used when a repository's fetch failed: a transient failure must not
    /// be interpreted as "all tags removed".
    pub fn carry_repo_from(&mut self, prior: &Self, repo: &str) {
        if let Some(tags) = prior.repos.get(repo) {
            self.repos.insert(repo.to_string(), tags.clone());
        }
    }

    /// Stamps the state with the current time.
    pub fn touch(&mut self) {
        self.last_checked = Some(Utc::now());
    }

    /// Returns the number of tracked (repo, tag) keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repos.values().map(BTreeMap::len).sum()
    }

    /// Returns true when no keys are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repos.values().all(BTreeMap::is_empty)
    }

    /// Iterates over all (repo, tag, digest) entries in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.repos.iter().flat_map(|(repo, tags)| {
            tags.iter()
                .map(move |(tag, digest)| (repo.as_str(), tag.as_str(), digest.as_str()))
        })
    }
}
