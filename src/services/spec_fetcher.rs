//! Upstream interface description and version retrieval
//!
//! [`SpecFetcher`] performs bounded-timeout GETs against the configured
//! description and version URLs. It never touches process state: every
//! failure is returned to the caller, which decides whether to fall back.

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{InterfaceDescription, SanitizedDescription, VersionToken};
use crate::services::schema_sanitizer;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub const DESCRIPTION_TIMEOUT: Duration = Duration::from_secs(10);
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of interface descriptions and version tokens
///
/// Implemented by [`SpecFetcher`] for the real upstream; the reload and
/// polling machinery only depends on this trait.
#[async_trait]
pub trait SpecSource: Send + Sync {
    async fn fetch_description(&self) -> Result<SanitizedDescription, FetchError>;

    async fn fetch_version(&self) -> Result<VersionToken, FetchError>;
}

#[derive(Clone)]
pub struct SpecFetcher {
    client: reqwest::Client,
    spec_url: String,
    version_url: String,
}

impl SpecFetcher {
    pub fn new(spec_url: impl Into<String>, version_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            spec_url: spec_url.into(),
            version_url: version_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.spec_url(), config.version_url())
    }

    pub fn spec_url(&self) -> &str {
        &self.spec_url
    }

    pub fn version_url(&self) -> &str {
        &self.version_url
    }

    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fetches the raw description without sanitizing it
    pub async fn fetch_raw_description(&self) -> Result<InterfaceDescription, FetchError> {
        tracing::info!("Fetching OpenAPI spec from {}", self.spec_url);

        let document = self.get_json(&self.spec_url, DESCRIPTION_TIMEOUT).await?;
        let description = InterfaceDescription::new(document);
        validate(&description)?;

        tracing::info!(
            endpoints = description.endpoint_count(),
            "Successfully loaded OpenAPI spec"
        );
        Ok(description)
    }
}

#[async_trait]
impl SpecSource for SpecFetcher {
    async fn fetch_description(&self) -> Result<SanitizedDescription, FetchError> {
        let result = self.fetch_raw_description().await;

        match result {
            Ok(description) => {
                tracing::info!("Patching OpenAPI spec to handle conflicting keywords...");
                Ok(schema_sanitizer::sanitize(&description))
            }
            Err(e) => {
                tracing::error!(
                    failure_kind = e.kind(),
                    url = %self.spec_url,
                    "Failed to fetch OpenAPI spec: {}",
                    e
                );
                Err(e)
            }
        }
    }

    async fn fetch_version(&self) -> Result<VersionToken, FetchError> {
        let document = self.get_json(&self.version_url, VERSION_TIMEOUT).await?;

        VersionToken::from_document(&document)
            .ok_or_else(|| FetchError::MissingVersion(self.version_url.clone()))
    }
}

/// Checks the two mandatory top-level markers of an interface description
pub fn validate(description: &InterfaceDescription) -> Result<(), FetchError> {
    let document = description.document();

    if !document.is_object() {
        return Err(FetchError::Validation(
            "document is not a JSON object".to_string(),
        ));
    }

    match description.format_version() {
        Some(Value::String(v)) if !v.is_empty() => {}
        Some(_) => {
            return Err(FetchError::Validation(
                "'openapi' field is not a version string".to_string(),
            ))
        }
        None => {
            return Err(FetchError::Validation(
                "missing 'openapi' field".to_string(),
            ))
        }
    }

    match document.get("paths") {
        Some(Value::Object(paths)) if !paths.is_empty() => Ok(()),
        Some(Value::Object(_)) => Err(FetchError::Validation(
            "'paths' map is empty".to_string(),
        )),
        Some(_) => Err(FetchError::Validation(
            "'paths' is not an object".to_string(),
        )),
        None => Err(FetchError::Validation("missing 'paths' field".to_string())),
    }
}
