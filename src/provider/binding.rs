//! Wallet provider trait and the binding that guards its absence.

use async_trait::async_trait;
use std::sync::Arc;

use crate::blockchain::types::{AccountAddress, TransactionPayload};
use crate::observability::metrics;
use crate::provider::types::{WalletError, WalletResult};

/// An injected wallet: authorization plus signing.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the user to authorize this client. Returns the authorized address.
    async fn connect(&self) -> WalletResult<AccountAddress>;

    /// Release the authorization.
    async fn disconnect(&self) -> WalletResult<()>;

    /// Currently authorized address, without prompting.
    async fn account(&self) -> WalletResult<Option<AccountAddress>>;

    /// Sign `payload` and submit it to the network. Returns the transaction hash.
    async fn sign_and_submit_transaction(&self, payload: &TransactionPayload) -> WalletResult<String>;
}

/// Mediates between callers and an optional provider.
#[derive(Clone)]
pub struct ProviderBinding {
    provider: Option<Arc<dyn WalletProvider>>,
    install_url: String,
}

impl ProviderBinding {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, install_url: impl Into<String>) -> Self {
        let binding = Self {
            provider,
            install_url: install_url.into(),
        };
        metrics::record_provider_present(binding.detect());
        binding
    }

    /// A binding with no provider injected.
    pub fn absent(install_url: impl Into<String>) -> Self {
        Self::new(None, install_url)
    }

    /// Whether a provider is injected. No side effects.
    pub fn detect(&self) -> bool {
        self.provider.is_some()
    }

    pub fn install_url(&self) -> &str {
        &self.install_url
    }

    fn provider(&self) -> WalletResult<&Arc<dyn WalletProvider>> {
        self.provider.as_ref().ok_or_else(|| WalletError::ProviderAbsent {
            install_url: self.install_url.clone(),
        })
    }

    /// Request authorization.
    pub async fn connect(&self) -> WalletResult<AccountAddress> {
        let provider = self.provider()?;
        match provider.connect().await {
            Ok(address) => {
                tracing::info!(address = %address, "Wallet authorized");
                Ok(address)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Wallet connect failed");
                Err(e)
            }
        }
    }

    /// Currently authorized address. An absent provider means no session.
    pub async fn get_account(&self) -> WalletResult<Option<AccountAddress>> {
        match &self.provider {
            Some(provider) => provider.account().await,
            None => Ok(None),
        }
    }

    /// Best-effort release. Provider failures are logged, never returned.
    pub async fn disconnect(&self) {
        if let Some(provider) = &self.provider {
            if let Err(e) = provider.disconnect().await {
                tracing::warn!(error = %e, "Provider disconnect failed; clearing local session anyway");
            }
        }
    }

    /// Forward `payload` for signing and submission. Unclassified provider
    /// failures count as failed submissions; rejections pass through.
    pub async fn submit(&self, payload: &TransactionPayload) -> WalletResult<String> {
        let provider = self.provider()?;
        tracing::debug!(function = payload.function(), "Submitting payload to provider");
        let hash = provider
            .sign_and_submit_transaction(payload)
            .await
            .map_err(|e| match e {
                WalletError::Provider(reason) => WalletError::SubmissionFailed(reason),
                other => other,
            })?;
        tracing::info!(hash = %hash, function = payload.function(), "Transaction submitted");
        Ok(hash)
    }
}

impl std::fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBinding")
            .field("detected", &self.detect())
            .field("install_url", &self.install_url)
            .finish()
    }
}
