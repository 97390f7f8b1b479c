//! Registry wire-protocol types.
//!
//! Covers the subset of the Docker Registry v2 / OCI Distribution API the
//! client consumes: the tag-list document and manifest lists (indexes).
//! Single manifests are never parsed; their digest comes from the
//! `Docker-Content-Digest` response header or a hash of the raw body.

use serde::{Deserialize, Deserializer};

/// Docker image manifest media type (schema 2).
pub const DOCKER_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Docker manifest list media type.
pub const DOCKER_MANIFEST_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";

/// OCI image manifest media type.
pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

/// OCI image index media type.
pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";

/// Accept header value covering every manifest flavor the client handles.
#[must_use]
pub fn manifest_accept_header() -> String {
    [DOCKER_MANIFEST, DOCKER_MANIFEST_LIST, OCI_MANIFEST, OCI_INDEX].join(", ")
}

/// Returns true when a Content-Type denotes a manifest list / index.
#[must_use]
pub fn is_manifest_list(content_type: &str) -> bool {
    let content_type = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    content_type == DOCKER_MANIFEST_LIST || content_type == OCI_INDEX
}

/// Response from the `/v2/<name>/tags/list` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TagList {
    /// Repository name.
    pub name: String,

    /// Tags on this page. Registries return `null` for empty repositories.
    #[serde(default, deserialize_with = "nullable_vec")]
    pub tags: Vec<String>,
}

fn nullable_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A manifest list (Docker) or image index (OCI): one tag pointing at
/// several platform-specific manifests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestList {
    /// Schema version (always 2).
    pub schema_version: u32,

    /// Platform-specific manifest entries, in list order.
    #[serde(default)]
    pub manifests: Vec<ManifestEntry>,
}

impl ManifestList {
    /// Selects the entry for the target architecture, or the first entry
    /// in list order when no architecture is specified.
    #[must_use]
    pub fn select(&self, architecture: Option<&str>) -> Option<&ManifestEntry> {
        match architecture {
            Some(arch) => self
                .manifests
                .iter()
                .find(|entry| entry.platform.as_ref().is_some_and(|p| p.architecture == arch)),
            None => self.manifests.first(),
        }
    }
}

/// One platform entry inside a manifest list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Digest of the platform-specific manifest.
    pub digest: String,

    /// Media type of the referenced manifest.
    #[serde(default)]
    pub media_type: Option<String>,

    /// Platform the manifest targets.
    #[serde(default)]
    pub platform: Option<Platform>,
}

/// Platform descriptor inside a manifest-list entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Platform {
    /// CPU architecture (e.g., "amd64", "arm64").
    pub architecture: String,

    /// Operating system (e.g., "windows", "linux").
    #[serde(default)]
    pub os: Option<String>,

    /// OS version, set for Windows images.
    #[serde(default, rename = "os.version")]
    pub os_version: Option<String>,
}
