//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every component from a validated configuration
//! - Decide which wallet provider (if any) is injected
//! - Restore the previous session before handing control to callers
//!
//! # Design Decisions
//! - Fail fast: a malformed URL or key is a startup error
//! - A missing wallet key is not an error; the binding reports the
//!   provider absent instead
//! - Components initialize in order: node client, provider, session,
//!   submitter, storage

use std::sync::Arc;
use thiserror::Error;

use crate::blockchain::types::{AccountAddress, ChainError};
use crate::blockchain::wallet::ApprovalHook;
use crate::blockchain::{ChainReader, LocalWallet, RestClient, TransactionSubmitter};
use crate::config::{ProviderKind, VaultConfig};
use crate::provider::{ProviderBinding, WalletError, WalletProvider};
use crate::records::HealthVault;
use crate::session::{FileSessionStore, SessionState};
use crate::storage::{IpfsClient, StorageError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Chain client: {0}")]
    Chain(#[from] ChainError),

    #[error("Wallet: {0}")]
    Wallet(#[from] WalletError),

    #[error("Storage client: {0}")]
    Storage(#[from] StorageError),
}

/// Everything a caller needs after startup.
pub struct VaultRuntime {
    pub vault: HealthVault,
    /// Direct node access for diagnostics (ledger info, raw reads).
    pub node: RestClient,
}

fn wallet_provider(
    config: &VaultConfig,
    node: &RestClient,
    approval: ApprovalHook,
) -> Result<Option<Arc<dyn WalletProvider>>, StartupError> {
    if config.wallet.provider == ProviderKind::Disabled {
        tracing::info!("Wallet provider disabled by configuration");
        return Ok(None);
    }

    let wallet = LocalWallet::from_env(&config.wallet.private_key_env, node.clone(), &config.submitter)?;
    Ok(wallet.map(|wallet| {
        let wallet = wallet
            .with_authorization_file(&config.wallet.authorization_path)
            .with_approval(approval);
        Arc::new(wallet) as Arc<dyn WalletProvider>
    }))
}

/// Wire all components. Does no network I/O.
pub fn assemble(config: &VaultConfig, approval: ApprovalHook) -> Result<VaultRuntime, StartupError> {
    let node = RestClient::new(&config.chain, config.retries.clone())?;
    let module_address: AccountAddress = config.chain.module_address.parse()?;

    let binding = ProviderBinding::new(wallet_provider(config, &node, approval)?, &config.session.install_url);
    let reader: Arc<dyn ChainReader> = Arc::new(node.clone());

    let session = Arc::new(SessionState::new(
        binding.clone(),
        Arc::new(FileSessionStore::new(&config.session.store_path)),
    ));
    let submitter = Arc::new(TransactionSubmitter::new(binding, reader.clone(), &config.submitter));
    let store = Arc::new(IpfsClient::new(&config.storage)?);

    tracing::info!(
        node = %node.base_url(),
        module = %module_address,
        provider = session.binding().detect(),
        "Components initialized"
    );

    Ok(VaultRuntime {
        vault: HealthVault::new(session, submitter, reader, store, module_address),
        node,
    })
}

/// Assemble, then restore the previous session. A failed restore is
/// logged and startup continues unauthenticated.
pub async fn start(config: &VaultConfig, approval: ApprovalHook) -> Result<VaultRuntime, StartupError> {
    let runtime = assemble(config, approval)?;

    match runtime.vault.session().restore().await {
        Ok(Some(address)) => tracing::info!(address = %address, "Session restored"),
        Ok(None) => tracing::debug!("No session to restore"),
        Err(e) => tracing::warn!(error = %e, "Session restore failed"),
    }

    Ok(runtime)
}
