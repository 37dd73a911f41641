//! Chain-specific types and error definitions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::provider::WalletError;

// Re-export ChainConfig from config module to avoid duplication
pub use crate::config::schema::ChainConfig;

/// A 32-byte account address, rendered as `0x` followed by 64 hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress([u8; AccountAddress::LENGTH]);

impl AccountAddress {
    /// Address length in bytes.
    pub const LENGTH: usize = 32;

    pub const fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }

    /// Full-length lowercase hex with `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountAddress {
    type Err = ChainError;

    /// Accepts `0x`-prefixed or bare hex. Short forms such as `0x1` are
    /// left-padded with zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if digits.is_empty() || digits.len() > Self::LENGTH * 2 {
            return Err(ChainError::InvalidAddress(s.to_string()));
        }

        let padded = format!("{:0>width$}", digits, width = Self::LENGTH * 2);
        let mut bytes = [0u8; Self::LENGTH];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|_| ChainError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({})", self.to_hex())
    }
}

impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Check that `path` looks like `<address>::<module>::<name>`.
///
/// Used for entry functions, view functions and resource types alike; a
/// resource type may carry generic parameters after the name.
pub fn validate_function_path(path: &str) -> ChainResult<()> {
    let mut parts = path.splitn(3, "::");
    let (Some(address), Some(module), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ChainError::InvalidFunction(path.to_string()));
    };

    address
        .parse::<AccountAddress>()
        .map_err(|_| ChainError::InvalidFunction(path.to_string()))?;

    let is_ident = |s: &str| {
        !s.is_empty()
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !s.starts_with(|c: char| c.is_ascii_digit())
    };
    let base_name = name.split('<').next().unwrap_or(name);
    if !is_ident(module) || !is_ident(base_name) {
        return Err(ChainError::InvalidFunction(path.to_string()));
    }
    Ok(())
}

/// Entry-function payload handed to the wallet provider.
///
/// Immutable once built; construct one per submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "entry_function_payload")]
pub struct TransactionPayload {
    function: String,
    type_arguments: Vec<String>,
    arguments: Vec<Value>,
}

impl TransactionPayload {
    /// Build a payload for `function` (`address::module::function`).
    pub fn entry_function(
        function: impl Into<String>,
        type_arguments: Vec<String>,
        arguments: Vec<Value>,
    ) -> ChainResult<Self> {
        let function = function.into();
        validate_function_path(&function)?;
        Ok(Self {
            function,
            type_arguments,
            arguments,
        })
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn type_arguments(&self) -> &[String] {
        &self.type_arguments
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }
}

/// Outcome of a confirmed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// Hash assigned by the provider at submission time.
    pub hash: String,
    /// True only once the chain reported the transaction committed.
    pub confirmed: bool,
    /// Ledger version the transaction landed in, when known.
    pub version: Option<u64>,
}

/// What the node currently knows about a transaction hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// The node has never seen the hash (yet).
    NotFound,
    /// Accepted into the mempool, not yet executed.
    Pending,
    /// Executed and committed to the ledger.
    Committed {
        success: bool,
        vm_status: String,
        version: Option<u64>,
    },
}

/// Errors that can occur during chain reads.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Connection or transport failure.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The account has not published this resource type.
    #[error("Resource {resource_type} not found under {address}")]
    ResourceNotFound {
        address: AccountAddress,
        resource_type: String,
    },

    /// Node answered with a non-success status.
    #[error("Node returned {status}: {message}")]
    Api {
        status: u16,
        error_code: Option<String>,
        message: String,
    },

    /// Response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid function path '{0}'")]
    InvalidFunction(String),
}

impl ChainError {
    /// Transport failures and server-side errors may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChainError::Rpc(_) | ChainError::Timeout(_) => true,
            ChainError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors from `submit_and_confirm`.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The provider refused or failed to submit. Nothing reached the chain.
    #[error("Transaction rejected: {0}")]
    Rejected(#[from] WalletError),

    /// Submitted, but commitment was not observed in time. The transaction
    /// may still land.
    #[error("Transaction {hash} not confirmed within {waited_secs} seconds")]
    Timeout { hash: String, waited_secs: u64 },

    /// Committed, but execution failed.
    #[error("Transaction {hash} aborted: {vm_status}")]
    Aborted { hash: String, vm_status: String },
}
