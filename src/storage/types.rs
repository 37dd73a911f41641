//! Content storage types and errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque identifier returned by the content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '/' || c == '?' || c == '#') {
            return Err(StorageError::InvalidContentId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ContentId {
    type Error = StorageError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ContentId> for String {
    fn from(cid: ContentId) -> Self {
        cid.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render `<gateway-base>/<cid>`.
pub fn gateway_url(gateway_base: &str, cid: &ContentId) -> String {
    format!("{}/{}", gateway_base.trim_end_matches('/'), cid)
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage request failed: {0}")]
    Http(String),

    #[error("Storage request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Storage endpoint returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid storage response: {0}")]
    Decode(String),

    #[error("Invalid content identifier '{0}'")]
    InvalidContentId(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Accepts blobs, hands back content identifiers, serves them via a gateway.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `bytes` under the display name `name`.
    async fn put(&self, bytes: Vec<u8>, name: &str) -> StorageResult<ContentId>;

    /// Fetch content through the public gateway.
    async fn fetch(&self, cid: &ContentId) -> StorageResult<Vec<u8>>;

    /// Public URL of `cid`.
    fn gateway_url(&self, cid: &ContentId) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_validation() {
        assert!("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG".parse::<ContentId>().is_ok());
        assert!("".parse::<ContentId>().is_err());
        assert!("Qm abc".parse::<ContentId>().is_err());
        assert!("../etc/passwd".parse::<ContentId>().is_err());
    }

    #[test]
    fn test_gateway_url_template() {
        let cid: ContentId = "bafybeigdyrzt".parse().unwrap();
        assert_eq!(gateway_url("https://ipfs.io/ipfs", &cid), "https://ipfs.io/ipfs/bafybeigdyrzt");
        assert_eq!(gateway_url("https://ipfs.io/ipfs/", &cid), "https://ipfs.io/ipfs/bafybeigdyrzt");
    }

    #[test]
    fn test_content_id_serde_rejects_invalid() {
        let ok: ContentId = serde_json::from_str("\"bafy\"").unwrap();
        assert_eq!(ok.as_str(), "bafy");
        assert!(serde_json::from_str::<ContentId>("\"\"").is_err());
    }
}
