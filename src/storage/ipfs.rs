//! IPFS HTTP API client.
//!
//! Uploads go to `<api_url>/api/v0/add`; downloads go through the public
//! gateway so that what the client fetches is what a browser would see.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::StorageConfig;
use crate::observability::metrics;
use crate::storage::types::{gateway_url, ContentId, ContentStore, StorageError, StorageResult};

/// Response of `/api/v0/add`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
    hash: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Clone)]
pub struct IpfsClient {
    http: reqwest::Client,
    api_url: String,
    gateway_url: String,
    credentials: Option<(String, String)>,
    timeout_duration: Duration,
}

impl IpfsClient {
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        url::Url::parse(&config.api_url)
            .map_err(|e| StorageError::Http(format!("Invalid API URL '{}': {}", config.api_url, e)))?;

        let credentials = match (&config.project_id, &config.project_secret) {
            (Some(id), Some(secret)) => Some((id.clone(), secret.clone())),
            _ => None,
        };

        Ok(Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            gateway_url: config.gateway_url.clone(),
            credentials,
            timeout_duration: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Send and read the whole body within the deadline.
    async fn send(&self, request: RequestBuilder) -> StorageResult<Vec<u8>> {
        let exchange = async {
            let response = request.send().await.map_err(|e| StorageError::Http(e.to_string()))?;
            let status = response.status();
            let body = response.bytes().await.map_err(|e| StorageError::Http(e.to_string()))?;
            Ok::<_, StorageError>((status, body))
        };
        let (status, body) = match timeout(self.timeout_duration, exchange).await {
            Ok(result) => result?,
            Err(_) => return Err(StorageError::Timeout(self.timeout_duration.as_secs())),
        };

        if !status.is_success() {
            return Err(StorageError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ContentStore for IpfsClient {
    async fn put(&self, bytes: Vec<u8>, name: &str) -> StorageResult<ContentId> {
        let size = bytes.len();
        let form = Form::new().part("file", Part::bytes(bytes).file_name(name.to_string()));

        let mut request = self
            .http
            .post(format!("{}/api/v0/add", self.api_url))
            .query(&[("pin", "true")])
            .multipart(form);
        if let Some((id, secret)) = &self.credentials {
            request = request.basic_auth(id, Some(secret));
        }

        let body = self.send(request).await?;
        let added: AddResponse = serde_json::from_slice(&body).map_err(|e| StorageError::Decode(e.to_string()))?;

        let cid: ContentId = added.hash.parse()?;
        metrics::record_upload(size);
        tracing::info!(cid = %cid, name = ?added.name, bytes = size, "Content stored");
        Ok(cid)
    }

    async fn fetch(&self, cid: &ContentId) -> StorageResult<Vec<u8>> {
        let url = self.gateway_url(cid);
        let bytes = self.send(self.http.get(&url)).await?;
        tracing::debug!(cid = %cid, bytes = bytes.len(), "Content fetched");
        Ok(bytes)
    }

    fn gateway_url(&self, cid: &ContentId) -> String {
        gateway_url(&self.gateway_url, cid)
    }
}

impl std::fmt::Debug for IpfsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpfsClient")
            .field("api_url", &self.api_url)
            .field("gateway_url", &self.gateway_url)
            .field("authenticated", &self.credentials.is_some())
            .finish()
    }
}
