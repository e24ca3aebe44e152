use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use serde::Deserialize;
use url::Url;

use crate::config::{JSONBIN_API_KEY, JsonBinConfig};
use crate::error::{CatalogError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a conditional read.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Modified {
        data: serde_json::Value,
        revision: Option<String>,
    },
    /// The prior revision is still current; nothing was transferred.
    NotModified,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch(&self, document_id: &str, prior_revision: Option<&str>)
    -> Result<FetchOutcome>;
}

/// JSONBin v3 document reader.
#[derive(Debug, Clone)]
pub struct JsonBinClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BinEnvelope {
    record: serde_json::Value,
}

impl JsonBinClient {
    pub fn new(config: &JsonBinConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| CatalogError::Config(format!("build http client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn latest_endpoint(&self, document_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CatalogError::Config(format!("invalid remote store url: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(["b", document_id, "latest"]);
        Ok(url)
    }
}

#[async_trait]
impl RemoteStore for JsonBinClient {
    async fn fetch(
        &self,
        document_id: &str,
        prior_revision: Option<&str>,
    ) -> Result<FetchOutcome> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CatalogError::missing_env(JSONBIN_API_KEY))?;
        let endpoint = self.latest_endpoint(document_id)?;

        let mut request = self
            .client
            .get(endpoint.clone())
            .header("X-Master-Key", api_key);
        if let Some(revision) = prior_revision {
            request = request.header(IF_NONE_MATCH, revision);
        }

        tracing::debug!(document_id, revision = ?prior_revision, "remote store fetch");
        let response = request
            .send()
            .await
            .map_err(|err| CatalogError::RemoteUnavailable(format!("GET {endpoint}: {err}")))?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(CatalogError::RemoteUnavailable(format!(
                "GET {endpoint}: status {status}"
            )));
        }

        let revision = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let envelope: BinEnvelope = response.json().await.map_err(|err| {
            CatalogError::RemoteUnavailable(format!("decode {document_id} document: {err}"))
        })?;

        Ok(FetchOutcome::Modified {
            data: envelope.record,
            revision,
        })
    }
}
