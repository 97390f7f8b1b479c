//! S3 object-storage state backend.
//!
//! Works against AWS S3 and S3-compatible services (MinIO, Wasabi,
//! DigitalOcean Spaces) via a custom endpoint. Atomicity comes from the
//! store itself: the whole document is replaced in a single `PutObject`,
//! never patched incrementally.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tagwatch_core::State;

use crate::error::StoreError;
use crate::StateStore;

/// Connection parameters for the S3 backend.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket holding the state object.
    pub bucket: String,

    /// Object key of the state document.
    pub key: String,

    /// AWS region; falls back to the ambient AWS configuration when unset.
    pub region: Option<String>,

    /// Custom endpoint URL for S3-compatible services.
    pub endpoint: Option<String>,
}

impl S3Config {
    /// Creates a configuration for the given bucket and key.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            region: None,
            endpoint: None,
        }
    }

    /// Sets the AWS region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets a custom endpoint for S3-compatible storage.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// State backend persisting to one S3 object.
pub struct S3Store {
    client: Client,
    bucket: String,
    key: String,
}

impl S3Store {
    /// Creates a store from connection parameters, loading credentials
    /// from the ambient AWS configuration.
    pub async fn new(config: S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = config.endpoint {
            tracing::debug!(endpoint, "using custom S3 endpoint");
            // Path-style addressing is required by MinIO and most other
            // S3-compatible services.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket,
            key: config.key,
        }
    }

    fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

#[async_trait]
impl StateStore for S3Store {
    async fn load(&self) -> Result<State, StoreError> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        let object = match result {
            Ok(object) => object,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    tracing::debug!(location = %self.location(), "no prior state object, starting empty");
                    return Ok(State::default());
                }
                return Err(StoreError::ReadFailed {
                    location: self.location(),
                    message: service_error.to_string(),
                });
            }
        };

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| StoreError::ReadFailed {
                location: self.location(),
                message: e.to_string(),
            })?
            .into_bytes();

        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            location: self.location(),
            message: e.to_string(),
        })
    }

    async fn save(&self, state: &State) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(state).map_err(|e| StoreError::WriteFailed {
            location: self.location(),
            message: format!("failed to serialize state: {e}"),
        })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .content_type("application/json")
            .body(ByteStream::from(json))
            .send()
            .await
            .map_err(|e| StoreError::WriteFailed {
                location: self.location(),
                message: e.into_service_error().to_string(),
            })?;

        tracing::debug!(location = %self.location(), entries = state.len(), "state saved");
        Ok(())
    }
}
