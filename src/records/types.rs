//! Health-record types and errors.

use serde::Serialize;
use thiserror::Error;

use crate::blockchain::types::{ChainError, SubmitError, TransactionResult};
use crate::provider::WalletError;
use crate::session::SessionError;
use crate::storage::{ContentId, StorageError};

/// A stored record as listed from the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordLink {
    pub cid: ContentId,
    pub gateway_url: String,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReceipt {
    pub cid: ContentId,
    pub gateway_url: String,
    pub transaction: TransactionResult,
}

#[derive(Debug, Error)]
pub enum VaultError {
    /// Mutating operation attempted without an authenticated session.
    #[error("No wallet connected")]
    NotConnected,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// On-chain data did not have the shape the module publishes.
    #[error("Malformed on-chain data: {0}")]
    Malformed(String),
}

impl VaultError {
    pub fn status_text(&self) -> String {
        match self {
            VaultError::NotConnected => "Connect a wallet first.".to_string(),
            VaultError::Session(e) => e.status_text(),
            VaultError::Submit(SubmitError::Rejected(e)) => e.status_text(),
            VaultError::Submit(SubmitError::Timeout { hash, .. }) => {
                format!("Status unknown for {}. It may still land; re-check later.", hash)
            }
            VaultError::Submit(SubmitError::Aborted { vm_status, .. }) => {
                format!("Transaction failed on chain: {}", vm_status)
            }
            VaultError::Chain(ChainError::ResourceNotFound { .. }) => "No records yet.".to_string(),
            VaultError::Chain(ChainError::Timeout(_) | ChainError::Rpc(_)) => {
                "Network unreachable. Try again.".to_string()
            }
            VaultError::Chain(e) => format!("Query failed: {}", e),
            VaultError::Storage(e) => format!("Upload failed: {}", e),
            VaultError::Malformed(reason) => format!("Unexpected on-chain data: {}", reason),
        }
    }
}

impl From<WalletError> for VaultError {
    fn from(e: WalletError) -> Self {
        VaultError::Session(SessionError::Wallet(e))
    }
}

/// Result type for record operations.
pub type VaultResult<T> = Result<T, VaultError>;
