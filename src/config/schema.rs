//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Module address of the canonical `health_record` deployment.
pub const DEFAULT_MODULE_ADDRESS: &str =
    "0xf430cd6ec35c1d5f4d908de0281326705cef62be4f634bbf6e5b8f12e3163135";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct VaultConfig {
    /// Chain node and module settings.
    pub chain: ChainConfig,

    /// Transaction submission and confirmation settings.
    pub submitter: SubmitterConfig,

    /// Content storage (IPFS) settings.
    pub storage: StorageConfig,

    /// Session persistence settings.
    pub session: SessionConfig,

    /// Wallet provider selection.
    pub wallet: WalletConfig,

    /// Retry configuration for read-only queries.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Chain read endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Fullnode REST endpoint (without the `/v1` suffix).
    pub node_url: String,

    /// Address the `health_record` module is published under.
    pub module_address: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            node_url: "https://fullnode.testnet.aptoslabs.com".to_string(),
            module_address: DEFAULT_MODULE_ADDRESS.to_string(),
            rpc_timeout_secs: 10,
        }
    }
}

/// Submission and confirmation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmitterConfig {
    /// How long to wait for a submitted transaction to commit.
    pub confirmation_timeout_secs: u64,

    /// Interval between status polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Gas limit attached to transactions signed by the local wallet.
    pub max_gas_amount: u64,

    /// Gas unit price in octas.
    pub gas_unit_price: u64,

    /// Transaction expiry, in seconds from signing time.
    pub expiration_secs: u64,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: 30,
            poll_interval_ms: 1000,
            max_gas_amount: 10_000,
            gas_unit_price: 100,
            expiration_secs: 600,
        }
    }
}

/// Content storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// IPFS HTTP API endpoint (the `/api/v0` prefix is appended).
    pub api_url: String,

    /// Public gateway base; content is served at `<gateway_url>/<cid>`.
    pub gateway_url: String,

    /// Basic-auth user for the API (e.g. an Infura project id).
    pub project_id: Option<String>,

    /// Basic-auth secret for the API.
    pub project_secret: Option<String>,

    /// Upload/download timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_url: "https://ipfs.infura.io:5001".to_string(),
            gateway_url: "https://ipfs.io/ipfs".to_string(),
            project_id: None,
            project_secret: None,
            timeout_secs: 60,
        }
    }
}

/// Session persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// File holding the last-known connected address.
    pub store_path: String,

    /// Where users are sent when no wallet provider is available.
    pub install_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: ".curavault/session.json".to_string(),
            install_url: "https://chrome.google.com/webstore/detail/petra-aptos-wallet/ejjladinnckdgjemekebdpeokbikhfci".to_string(),
        }
    }
}

/// Which wallet provider to inject at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// In-process Ed25519 key read from the environment.
    Local,
    /// No provider; every wallet operation reports `ProviderAbsent`.
    Disabled,
}

/// Wallet provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    pub provider: ProviderKind,

    /// Environment variable holding the hex-encoded private key.
    pub private_key_env: String,

    /// File in which the local wallet remembers that it authorized this
    /// client, so `account()` survives restarts.
    pub authorization_path: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Local,
            private_key_env: crate::blockchain::wallet::PRIVATE_KEY_ENV_VAR.to_string(),
            authorization_path: ".curavault/wallet-authorization".to_string(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Multi-line human-oriented log output instead of compact lines.
    pub pretty_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            pretty_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
