//! Registry client: tag listing and digest resolution.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LINK, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use url::Url;

use tagwatch_core::{pattern, RepositoryConfig, TagObservation};

use crate::auth::{BearerChallenge, TokenResponse};
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::oci::{self, ManifestList, TagList};

/// Source of (tag, digest) observations for a repository.
///
/// The reconciler depends on this seam rather than on the concrete HTTP
/// client, so tests can substitute a scripted source.
#[async_trait]
pub trait TagSource: Send + Sync {
    /// Returns one observation per existing tag that matches the
    /// repository's configured patterns, sorted by tag name and free of
    /// duplicates.
    async fn fetch_tag_digests(
        &self,
        repo: &RepositoryConfig,
    ) -> Result<Vec<TagObservation>, RegistryError>;
}

/// Client for the Docker Registry HTTP v2 API.
#[derive(Debug)]
pub struct RegistryClient {
    config: RegistryConfig,
    http: reqwest::Client,
}

/// Per-repository fetch state: the bearer token (if the registry required
/// one) and whether it has already been refreshed after a mid-run 401.
struct FetchContext<'a> {
    repo: &'a str,
    token: Option<String>,
    refreshed: bool,
}

impl RegistryClient {
    /// Creates a new registry client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tagwatch_registry::{RegistryClient, RegistryConfig};
    ///
    /// let config = RegistryConfig::new("https://mcr.microsoft.com");
    /// let client = RegistryClient::new(config)?;
    /// # Ok::<(), tagwatch_registry::RegistryError>(())
    /// ```
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| RegistryError::ConnectionFailed {
                url: config.url.clone(),
                source: e,
            })?;

        Ok(Self { config, http })
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Fetches the current digest of every tag that exists on the
    /// registry and matches the repository's configured patterns.
    ///
    /// The returned observations are sorted by tag name and contain no
    /// duplicate tags.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AuthenticationFailed`] when token
    /// negotiation fails, [`RegistryError::RepositoryNotFound`] when the
    /// repository does not exist, [`RegistryError::RetriesExhausted`] when
    /// transient failures persist through every attempt, and
    /// [`RegistryError::ManifestListUnresolved`] when a manifest list has
    /// no entry for the target platform.
    pub async fn fetch_tag_digests(
        &self,
        repo: &RepositoryConfig,
    ) -> Result<Vec<TagObservation>, RegistryError> {
        let token = self.authenticate(&repo.name).await?;
        let mut ctx = FetchContext {
            repo: &repo.name,
            token,
            refreshed: false,
        };

        let mut tags = self.list_tags(&mut ctx).await?;
        tags.sort();
        tags.dedup();
        tags.retain(|tag| pattern::matches(tag, &repo.tag_patterns));
        tracing::debug!(repo = %repo.name, matching_tags = tags.len(), "tag listing complete");

        let mut observations = Vec::with_capacity(tags.len());
        for tag in tags {
            if let Some(digest) = self.resolve_digest(&mut ctx, &tag).await? {
                observations.push(TagObservation::new(repo.name.clone(), tag, digest));
            }
        }

        Ok(observations)
    }

    /// Probes `/v2/` and, when challenged, negotiates an anonymous
    /// pull-scoped bearer token for the repository.
    ///
    /// Returns `None` when the registry accepts unauthenticated access.
    async fn authenticate(&self, repo: &str) -> Result<Option<String>, RegistryError> {
        let probe_url = format!("{}/v2/", self.config.url);
        let mut ctx = FetchContext {
            repo,
            token: None,
            // The probe expects a 401; never recurse into a refresh.
            refreshed: true,
        };

        let response = self.execute(&mut ctx, || self.http.get(&probe_url)).await?;
        if response.status().is_success() {
            return Ok(None);
        }
        if response.status() != StatusCode::UNAUTHORIZED {
            return Err(RegistryError::AuthenticationFailed {
                repo: repo.to_string(),
                message: format!("unexpected status {} from /v2/ probe", response.status()),
            });
        }

        let header = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| RegistryError::AuthenticationFailed {
                repo: repo.to_string(),
                message: "401 response without a WWW-Authenticate challenge".to_string(),
            })?;

        let challenge =
            BearerChallenge::parse(header).ok_or_else(|| RegistryError::AuthenticationFailed {
                repo: repo.to_string(),
                message: format!("unsupported authentication challenge: {header}"),
            })?;

        let token_url = challenge.token_url(repo)?;
        tracing::debug!(repo, realm = %challenge.realm, "requesting anonymous pull token");

        let response = self.http.get(token_url).send().await.map_err(|e| {
            RegistryError::AuthenticationFailed {
                repo: repo.to_string(),
                message: format!("token endpoint unreachable: {e}"),
            }
        })?;
        if !response.status().is_success() {
            return Err(RegistryError::AuthenticationFailed {
                repo: repo.to_string(),
                message: format!("token endpoint returned {}", response.status()),
            });
        }

        let body: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| RegistryError::AuthenticationFailed {
                    repo: repo.to_string(),
                    message: format!("invalid token response: {e}"),
                })?;

        body.into_token()
            .map(Some)
            .ok_or_else(|| RegistryError::AuthenticationFailed {
                repo: repo.to_string(),
                message: "token response contained no token".to_string(),
            })
    }

    /// Lists all tags for the repository, following `Link` continuation
    /// headers until the registry indicates the final page.
    async fn list_tags(&self, ctx: &mut FetchContext<'_>) -> Result<Vec<String>, RegistryError> {
        let mut tags = Vec::new();
        let mut next = format!(
            "{}/v2/{}/tags/list?n={}",
            self.config.url, ctx.repo, self.config.page_size
        );

        loop {
            let url = next.clone();
            let response = self.execute(ctx, || self.http.get(&url)).await?;
            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                return Err(RegistryError::RepositoryNotFound {
                    repo: ctx.repo.to_string(),
                });
            }
            if !status.is_success() {
                return Err(RegistryError::HttpError {
                    status: status.as_u16(),
                    message: response.text().await.unwrap_or_default(),
                });
            }

            let continuation = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_next_link);

            let page: TagList = response.json().await.map_err(RegistryError::from)?;
            tags.extend(page.tags);

            match continuation {
                Some(target) => next = self.absolute_url(&target)?,
                None => break,
            }
        }

        Ok(tags)
    }

    /// Resolves a tag to its content digest.
    ///
    /// A manifest list is resolved to the digest of its selected platform
    /// entry, never the list's own digest. Returns `Ok(None)` when the tag
    /// vanished between listing and manifest fetch.
    async fn resolve_digest(
        &self,
        ctx: &mut FetchContext<'_>,
        tag: &str,
    ) -> Result<Option<String>, RegistryError> {
        let url = format!("{}/v2/{}/manifests/{tag}", self.config.url, ctx.repo);
        let accept = oci::manifest_accept_header();

        let response = self
            .execute(ctx, || self.http.get(&url).header(ACCEPT, &accept))
            .await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::warn!(
                repo = ctx.repo,
                tag,
                "tag disappeared between listing and manifest fetch, skipping"
            );
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RegistryError::HttpError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let header_digest = response
            .headers()
            .get("docker-content-digest")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = response.bytes().await.map_err(RegistryError::from)?;

        if oci::is_manifest_list(&content_type) {
            let list: ManifestList =
                serde_json::from_slice(&body).map_err(|e| RegistryError::DecodeError {
                    message: format!("invalid manifest list for {}:{tag}: {e}", ctx.repo),
                })?;
            let entry = list.select(self.config.architecture.as_deref()).ok_or_else(|| {
                RegistryError::ManifestListUnresolved {
                    repo: ctx.repo.to_string(),
                    tag: tag.to_string(),
                    architecture: self.config.architecture.clone(),
                }
            })?;
            return Ok(Some(entry.digest.clone()));
        }

        Ok(Some(
            header_digest.unwrap_or_else(|| compute_digest(&body)),
        ))
    }

    /// Sends a request with bounded retry and exponential backoff.
    ///
    /// Transient failures (connection errors, timeouts, 5xx) are retried
    /// up to the configured attempt ceiling. A 401 triggers a single token
    /// refresh without consuming an attempt; any other response is handed
    /// back to the caller for status mapping.
    async fn execute<F>(
        &self,
        ctx: &mut FetchContext<'_>,
        build: F,
    ) -> Result<reqwest::Response, RegistryError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let retry = &self.config.retry;
        let mut backoff = retry.initial_backoff;
        let mut last_error = String::new();
        let mut attempt = 0;

        while attempt < retry.max_attempts {
            attempt += 1;

            let mut request = build();
            if let Some(token) = &ctx.token {
                request = request.bearer_auth(token);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::UNAUTHORIZED && !ctx.refreshed {
                        ctx.refreshed = true;
                        // Boxed: authenticate() itself issues requests
                        // through execute(), making the future recursive.
                        ctx.token = Box::pin(self.authenticate(ctx.repo)).await?;
                        attempt -= 1;
                        continue;
                    }
                    if status.is_server_error() {
                        last_error = format!("registry returned {status}");
                        tracing::debug!(
                            repo = ctx.repo,
                            attempt,
                            %status,
                            "transient registry error, will retry"
                        );
                    } else {
                        return Ok(response);
                    }
                }
                Err(e) => {
                    let err = RegistryError::from(e);
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    last_error = err.to_string();
                    tracing::debug!(
                        repo = ctx.repo,
                        attempt,
                        error = %last_error,
                        "request failed, will retry"
                    );
                }
            }

            if attempt < retry.max_attempts {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(retry.max_backoff);
            }
        }

        Err(RegistryError::RetriesExhausted {
            repo: ctx.repo.to_string(),
            attempts: retry.max_attempts,
            message: last_error,
        })
    }

    /// Resolves a possibly relative continuation target against the
    /// registry base URL.
    fn absolute_url(&self, target: &str) -> Result<String, RegistryError> {
        if target.starts_with("http://") || target.starts_with("https://") {
            return Ok(target.to_string());
        }
        let base = Url::parse(&self.config.url).map_err(|_| RegistryError::InvalidUrl {
            url: self.config.url.clone(),
        })?;
        base.join(target)
            .map(Into::into)
            .map_err(|_| RegistryError::InvalidUrl {
                url: target.to_string(),
            })
    }
}

#[async_trait]
impl TagSource for RegistryClient {
    async fn fetch_tag_digests(
        &self,
        repo: &RepositoryConfig,
    ) -> Result<Vec<TagObservation>, RegistryError> {
        Self::fetch_tag_digests(self, repo).await
    }
}

/// Extracts the `rel="next"` target from a `Link` header value.
fn parse_next_link(value: &str) -> Option<String> {
    for part in value.split(',') {
        let part = part.trim();
        let Some(rest) = part.strip_prefix('<') else {
            continue;
        };
        let Some((target, params)) = rest.split_once('>') else {
            continue;
        };
        if params.split(';').any(|p| p.trim() == r#"rel="next""#) {
            return Some(target.to_string());
        }
    }
    None
}

/// Computes the canonical digest of a raw manifest body.
fn compute_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_next_link() {
        let value = r#"</v2/windows/servercore/tags/list?last=ltsc2019&n=100>; rel="next""#;
        assert_eq!(
            parse_next_link(value).as_deref(),
            Some("/v2/windows/servercore/tags/list?last=ltsc2019&n=100")
        );
    }

    #[test]
    fn test_parse_next_link_among_other_relations() {
        let value = r#"</v2/r/tags/list?last=a>; rel="prev", </v2/r/tags/list?last=z>; rel="next""#;
        assert_eq!(
            parse_next_link(value).as_deref(),
            Some("/v2/r/tags/list?last=z")
        );
    }

    #[test]
    fn test_parse_next_link_absent() {
        assert!(parse_next_link(r#"</v2/r/tags/list?last=a>; rel="prev""#).is_none());
        assert!(parse_next_link("garbage").is_none());
    }

    #[test]
    fn test_compute_digest_format() {
        let digest = compute_digest(b"{}");
        assert!(digest.starts_with("sha256:"));
        assert_eq!(digest.len(), 7 + 64);
    }

    #[test]
    fn test_absolute_url_resolution() {
        let client = RegistryClient::new(RegistryConfig::new("https://mcr.microsoft.com")).unwrap();

        assert_eq!(
            client.absolute_url("/v2/r/tags/list?last=x").unwrap(),
            "https://mcr.microsoft.com/v2/r/tags/list?last=x"
        );
        assert_eq!(
            client.absolute_url("https://other.example.com/page").unwrap(),
            "https://other.example.com/page"
        );
    }
}
