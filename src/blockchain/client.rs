//! Chain REST client with timeout and error handling.
//!
//! # Responsibilities
//! - Read account resources and call view functions (no signature)
//! - Report transaction status by hash for confirmation polling
//! - Relay signing-message encoding and signed submissions for the local wallet
//! - Handle timeouts and network errors, retrying idempotent reads

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{
    validate_function_path, AccountAddress, ChainConfig, ChainError, ChainResult, TxStatus,
};
use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::retries::retry_idempotent;

/// Non-mutating access to chain state. Every call is a fresh round trip.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Fetch the `data` of `resource_type` stored under `address`.
    async fn fetch_resource(&self, address: &AccountAddress, resource_type: &str) -> ChainResult<Value>;

    /// Invoke a view function and return its result list.
    async fn fetch_view(&self, function: &str, arguments: Vec<Value>) -> ChainResult<Vec<Value>>;

    /// Look up a transaction by hash.
    async fn transaction_status(&self, hash: &str) -> ChainResult<TxStatus>;
}

/// Error body returned by the node on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    error_code: Option<String>,
}

/// Ledger summary from the node index.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerInfo {
    pub chain_id: u8,
    #[serde(deserialize_with = "de_u64_string")]
    pub ledger_version: u64,
    #[serde(deserialize_with = "de_u64_string")]
    pub ledger_timestamp: u64,
}

fn de_u64_string<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

/// REST client for a fullnode's `/v1` API.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    /// Base URL without trailing slash, `/v1` included.
    base_url: String,
    timeout_duration: Duration,
    retries: RetryConfig,
}

impl RestClient {
    /// Create a client for `config.node_url`.
    pub fn new(config: &ChainConfig, retries: RetryConfig) -> ChainResult<Self> {
        let parsed: url::Url = config.node_url.parse().map_err(|e| {
            ChainError::Rpc(format!("Invalid node URL '{}': {}", config.node_url, e))
        })?;

        let base_url = format!("{}/v1", parsed.as_str().trim_end_matches('/'));
        tracing::debug!(base_url = %base_url, "Chain client configured");

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            retries,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send with the configured deadline and decode the JSON body.
    ///
    /// Non-2xx answers become `ChainError::Api` carrying the node's error code.
    /// The deadline covers the body as well as the headers.
    async fn send(&self, request: RequestBuilder) -> ChainResult<Value> {
        let exchange = async {
            let response = request.send().await.map_err(|e| ChainError::Rpc(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ChainError::Rpc(format!("Failed to read response body: {}", e)))?;
            Ok::<_, ChainError>((status, body))
        };
        let (status, body) = match timeout(self.timeout_duration, exchange).await {
            Ok(result) => result?,
            Err(_) => return Err(ChainError::Timeout(self.timeout_duration.as_secs())),
        };

        if !status.is_success() {
            let (message, error_code) = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) => (parsed.message, parsed.error_code),
                Err(_) => (body, None),
            };
            return Err(ChainError::Api {
                status: status.as_u16(),
                error_code,
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ChainError::Decode(e.to_string()))
    }

    async fn get(&self, path: &str) -> ChainResult<Value> {
        self.send(self.http.get(self.endpoint(path))).await
    }

    async fn post(&self, path: &str, body: &Value) -> ChainResult<Value> {
        self.send(self.http.post(self.endpoint(path)).json(body)).await
    }

    /// Node index: chain id and ledger position.
    pub async fn ledger_info(&self) -> ChainResult<LedgerInfo> {
        let value = retry_idempotent(&self.retries, "ledger_info", || self.get("")).await?;
        serde_json::from_value(value).map_err(|e| ChainError::Decode(e.to_string()))
    }

    /// Next sequence number for `address`.
    pub async fn account_sequence_number(&self, address: &AccountAddress) -> ChainResult<u64> {
        let path = format!("accounts/{}", address);
        let value = retry_idempotent(&self.retries, "account", || self.get(&path)).await?;
        value
            .get("sequence_number")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ChainError::Decode("account has no sequence_number".to_string()))
    }

    /// Ask the node to produce the signing message for an unsigned transaction.
    pub async fn encode_submission(&self, unsigned: &Value) -> ChainResult<Vec<u8>> {
        let value = self.post("transactions/encode_submission", unsigned).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| ChainError::Decode("encode_submission did not return a string".to_string()))?;
        hex::decode(encoded.trim_start_matches("0x")).map_err(|e| ChainError::Decode(e.to_string()))
    }

    /// Submit a signed transaction. Returns its hash.
    ///
    /// Not retried: a resend after an ambiguous failure could double-submit.
    pub async fn submit_signed(&self, signed: &Value) -> ChainResult<String> {
        let value = self.post("transactions", signed).await?;
        value
            .get("hash")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ChainError::Decode("submission response has no hash".to_string()))
    }

    /// Check if the node is reachable.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get("").await.is_ok();
        metrics::record_query("health", healthy);
        healthy
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Interpret a `/transactions/by_hash` body.
pub fn parse_transaction_status(value: &Value) -> ChainResult<TxStatus> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ChainError::Decode("transaction has no type".to_string()))?;

    if kind == "pending_transaction" {
        return Ok(TxStatus::Pending);
    }

    let success = value
        .get("success")
        .and_then(Value::as_bool)
        .ok_or_else(|| ChainError::Decode("committed transaction has no success flag".to_string()))?;
    let vm_status = value
        .get("vm_status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let version = value
        .get("version")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok());

    Ok(TxStatus::Committed {
        success,
        vm_status,
        version,
    })
}

#[async_trait]
impl ChainReader for RestClient {
    async fn fetch_resource(&self, address: &AccountAddress, resource_type: &str) -> ChainResult<Value> {
        validate_function_path(resource_type)?;
        let path = format!("accounts/{}/resource/{}", address, resource_type);

        let result = retry_idempotent(&self.retries, "fetch_resource", || self.get(&path)).await;
        metrics::record_query("resource", result.is_ok());

        match result {
            Ok(mut value) => Ok(value.get_mut("data").map(Value::take).unwrap_or(Value::Null)),
            Err(ChainError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                tracing::debug!(address = %address, resource_type, "Resource not published");
                Err(ChainError::ResourceNotFound {
                    address: *address,
                    resource_type: resource_type.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_view(&self, function: &str, arguments: Vec<Value>) -> ChainResult<Vec<Value>> {
        validate_function_path(function)?;
        let body = json!({
            "function": function,
            "type_arguments": [],
            "arguments": arguments,
        });

        let result = retry_idempotent(&self.retries, "fetch_view", || self.post("view", &body)).await;
        metrics::record_query("view", result.is_ok());

        match result? {
            Value::Array(values) => Ok(values),
            other => Err(ChainError::Decode(format!("view returned non-array: {}", other))),
        }
    }

    async fn transaction_status(&self, hash: &str) -> ChainResult<TxStatus> {
        let path = format!("transactions/by_hash/{}", hash);
        let result = retry_idempotent(&self.retries, "transaction_status", || self.get(&path)).await;
        metrics::record_query("transaction", result.is_ok());

        match result {
            Ok(value) => parse_transaction_status(&value),
            Err(ChainError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(TxStatus::NotFound)
            }
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
