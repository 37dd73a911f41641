//! Wallet provider errors.

use thiserror::Error;

/// Errors surfaced by the wallet provider binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No provider is injected. Normal condition; direct the user to install one.
    #[error("No wallet provider detected (install one from {install_url})")]
    ProviderAbsent { install_url: String },

    /// The user declined the authorization prompt.
    #[error("Connection request rejected: {0}")]
    UserRejected(String),

    /// The user or provider declined to sign.
    #[error("Signing rejected: {0}")]
    SigningRejected(String),

    /// Signed, but the network or provider failed to accept the transaction.
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    /// Provider failed outside of the categories above.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl WalletError {
    /// Line suitable for a status bar.
    pub fn status_text(&self) -> String {
        match self {
            WalletError::ProviderAbsent { install_url } => {
                format!("No wallet found. Install one from {}", install_url)
            }
            WalletError::UserRejected(_) => {
                "Connection declined in the wallet. You can try again.".to_string()
            }
            WalletError::SigningRejected(_) => {
                "Signature declined in the wallet. You can try again.".to_string()
            }
            WalletError::SubmissionFailed(reason) => {
                format!("Submission failed ({}). You can retry.", reason)
            }
            WalletError::Provider(reason) => format!("Wallet error: {}", reason),
        }
    }
}

/// Result type for wallet provider operations.
pub type WalletResult<T> = Result<T, WalletError>;
