//! Anonymous bearer-token negotiation.
//!
//! Registries that require authentication answer an unauthenticated probe
//! of `/v2/` with a 401 carrying a `WWW-Authenticate: Bearer` challenge
//! naming the token endpoint (realm) and service. The client then requests
//! an anonymous pull-scoped token from that endpoint.

use serde::Deserialize;
use url::Url;

use crate::error::RegistryError;

/// A parsed `WWW-Authenticate: Bearer` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BearerChallenge {
    /// Token endpoint URL.
    pub realm: String,

    /// Service identifier to pass to the token endpoint.
    pub service: Option<String>,
}

impl BearerChallenge {
    /// Parses the header value, returning `None` for non-Bearer schemes
    /// or challenges without a realm.
    pub fn parse(header: &str) -> Option<Self> {
        let params = header.strip_prefix("Bearer ")?;

        let mut realm = None;
        let mut service = None;
        for param in params.split(',') {
            let (key, value) = param.trim().split_once('=')?;
            let value = value.trim_matches('"');
            match key {
                "realm" => realm = Some(value.to_string()),
                "service" => service = Some(value.to_string()),
                _ => {}
            }
        }

        Some(Self {
            realm: realm?,
            service,
        })
    }

    /// Builds the token-request URL scoped to pulling one repository.
    pub fn token_url(&self, repo: &str) -> Result<Url, RegistryError> {
        let mut url = Url::parse(&self.realm).map_err(|_| RegistryError::InvalidUrl {
            url: self.realm.clone(),
        })?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(service) = &self.service {
                query.append_pair("service", service);
            }
            query.append_pair("scope", &format!("repository:{repo}:pull"));
        }

        Ok(url)
    }
}

/// Token endpoint response. Some registries use `token`, others
/// `access_token`; both are accepted.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    token: Option<String>,

    #[serde(default)]
    access_token: Option<String>,
}

impl TokenResponse {
    /// Returns the bearer token, whichever field carried it.
    pub fn into_token(self) -> Option<String> {
        self.token.or(self.access_token)
    }
}
