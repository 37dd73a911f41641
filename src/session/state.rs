//! Session state: the single source of truth for who is connected.
//!
//! # State Transitions
//! ```text
//! Unauthenticated → Authenticated: connect succeeds, or restore finds an account
//! Authenticated → Unauthenticated: disconnect, or provider revokes
//! ```
//!
//! In-memory state and the persisted slot change together: the slot is
//! written first and the in-memory value only follows if that succeeded.

use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, Mutex};

use crate::blockchain::types::AccountAddress;
use crate::provider::{ProviderBinding, WalletError};
use crate::session::store::SessionStore;

/// Current session as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Session {
    pub address: Option<AccountAddress>,
    pub connected: bool,
}

impl Session {
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn authenticated(address: AccountAddress) -> Self {
        Self {
            address: Some(address),
            connected: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// The slot could not be updated; in-memory state was left as it was.
    #[error("Failed to persist session: {0}")]
    Persist(#[from] io::Error),
}

impl SessionError {
    pub fn status_text(&self) -> String {
        match self {
            SessionError::Wallet(e) => e.status_text(),
            SessionError::Persist(e) => format!("Could not save session ({}). Nothing was changed.", e),
        }
    }
}

/// Owns the session; everyone else subscribes.
pub struct SessionState {
    binding: ProviderBinding,
    store: Arc<dyn SessionStore>,
    tx: watch::Sender<Session>,
    /// Serializes connect/disconnect/restore against each other.
    op: Mutex<()>,
}

impl SessionState {
    pub fn new(binding: ProviderBinding, store: Arc<dyn SessionStore>) -> Self {
        let (tx, _) = watch::channel(Session::unauthenticated());
        Self {
            binding,
            store,
            tx,
            op: Mutex::new(()),
        }
    }

    /// Reactive view of the session.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Session {
        *self.tx.borrow()
    }

    pub fn binding(&self) -> &ProviderBinding {
        &self.binding
    }

    fn set(&self, session: Session) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == session {
                false
            } else {
                *current = session;
                true
            }
        });
        if changed {
            tracing::info!(address = ?session.address, connected = session.connected, "Session changed");
        }
    }

    fn authenticate(&self, address: AccountAddress) -> Result<AccountAddress, SessionError> {
        self.store.save(&address.to_hex())?;
        self.set(Session::authenticated(address));
        Ok(address)
    }

    fn unauthenticate(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        self.set(Session::unauthenticated());
        Ok(())
    }

    /// Silent restoration: trust the provider's current account, never the
    /// persisted hint alone. Calling this repeatedly yields the same result.
    pub async fn restore(&self) -> Result<Option<AccountAddress>, SessionError> {
        let _guard = self.op.lock().await;

        let hint = match self.store.load() {
            Ok(hint) => hint,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read persisted session");
                None
            }
        };

        if !self.binding.detect() {
            tracing::debug!(hint = ?hint, "No provider; session stays unauthenticated");
            return Ok(None);
        }

        match self.binding.get_account().await {
            Ok(Some(address)) => {
                if hint.as_deref() != Some(address.to_hex().as_str()) {
                    tracing::debug!(hint = ?hint, address = %address, "Provider account differs from hint");
                }
                self.authenticate(address).map(Some)
            }
            Ok(None) => {
                if hint.is_some() || self.current().connected {
                    self.unauthenticate()?;
                }
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Provider account query failed; not restoring");
                Ok(self.current().address)
            }
        }
    }

    /// Prompt for authorization and record the session.
    pub async fn connect(&self) -> Result<AccountAddress, SessionError> {
        let _guard = self.op.lock().await;
        let address = self.binding.connect().await?;
        self.authenticate(address)
    }

    /// Clear the slot, release the provider (best-effort), then drop the session.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        let _guard = self.op.lock().await;
        self.store.clear()?;
        self.binding.disconnect().await;
        self.set(Session::unauthenticated());
        Ok(())
    }

    /// The provider withdrew authorization on its own.
    pub async fn revoke(&self) -> Result<(), SessionError> {
        let _guard = self.op.lock().await;
        tracing::info!("Provider revoked authorization");
        self.unauthenticate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::TransactionPayload;
    use crate::provider::{WalletProvider, WalletResult};
    use crate::session::store::MemorySessionStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    const ADDR: AccountAddress = AccountAddress::new([7; 32]);

    #[derive(Default)]
    struct FakeWallet {
        authorized: AtomicBool,
        reject: bool,
    }

    #[async_trait]
    impl WalletProvider for FakeWallet {
        async fn connect(&self) -> WalletResult<AccountAddress> {
            if self.reject {
                return Err(WalletError::UserRejected("no".into()));
            }
            self.authorized.store(true, Ordering::SeqCst);
            Ok(ADDR)
        }
        async fn disconnect(&self) -> WalletResult<()> {
            self.authorized.store(false, Ordering::SeqCst);
            Err(WalletError::Provider("flaky extension".into()))
        }
        async fn account(&self) -> WalletResult<Option<AccountAddress>> {
            Ok(self.authorized.load(Ordering::SeqCst).then_some(ADDR))
        }
        async fn sign_and_submit_transaction(&self, _: &TransactionPayload) -> WalletResult<String> {
            Ok("0x1".into())
        }
    }

    struct FailingStore;

    impl SessionStore for FailingStore {
        fn load(&self) -> io::Result<Option<String>> {
            Ok(None)
        }
        fn save(&self, _: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
        fn clear(&self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    fn state_with(wallet: FakeWallet, store: Arc<dyn SessionStore>) -> SessionState {
        SessionState::new(ProviderBinding::new(Some(Arc::new(wallet)), "https://install"), store)
    }

    #[tokio::test]
    async fn test_connect_updates_state_and_slot() {
        let store = Arc::new(MemorySessionStore::new());
        let state = state_with(FakeWallet::default(), store.clone());
        let mut rx = state.subscribe();

        assert_eq!(state.connect().await.unwrap(), ADDR);
        assert_eq!(state.current(), Session::authenticated(ADDR));
        assert_eq!(store.load().unwrap(), Some(ADDR.to_hex()));

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Session::authenticated(ADDR));
    }

    #[tokio::test]
    async fn test_restore_is_idempotent() {
        let wallet = FakeWallet::default();
        wallet.authorized.store(true, Ordering::SeqCst);
        let state = state_with(wallet, Arc::new(MemorySessionStore::new()));

        let first = state.restore().await.unwrap();
        let second = state.restore().await.unwrap();
        assert_eq!(first, Some(ADDR));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_disconnect_clears_slot_despite_provider_error() {
        let store = Arc::new(MemorySessionStore::new());
        let state = state_with(FakeWallet::default(), store.clone());
        state.connect().await.unwrap();

        state.disconnect().await.unwrap();
        assert_eq!(state.current(), Session::unauthenticated());
        assert_eq!(store.load().unwrap(), None);
        // provider no longer vouches for the account, so restore stays out
        assert_eq!(state.restore().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stale_hint_is_not_trusted() {
        let store = Arc::new(MemorySessionStore::new());
        store.save(&ADDR.to_hex()).unwrap();
        let state = state_with(FakeWallet::default(), store.clone());

        assert_eq!(state.restore().await.unwrap(), None);
        assert!(!state.current().connected);
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_state_unchanged() {
        let state = state_with(FakeWallet::default(), Arc::new(FailingStore));

        let err = state.connect().await.unwrap_err();
        assert!(matches!(err, SessionError::Persist(_)));
        assert_eq!(state.current(), Session::unauthenticated());
    }

    #[tokio::test]
    async fn test_rejected_connect() {
        let state = state_with(FakeWallet { reject: true, ..Default::default() }, Arc::new(MemorySessionStore::new()));
        let err = state.connect().await.unwrap_err();
        assert!(matches!(err, SessionError::Wallet(WalletError::UserRejected(_))));
        assert!(!state.current().connected);
    }

    #[tokio::test]
    async fn test_absent_provider() {
        let store = Arc::new(MemorySessionStore::new());
        store.save(&ADDR.to_hex()).unwrap();
        let state = SessionState::new(ProviderBinding::absent("https://install"), store.clone());

        let err = state.connect().await.unwrap_err();
        assert!(err.status_text().contains("https://install"));
        assert_eq!(state.restore().await.unwrap(), None);
        // the hint is kept for when a provider shows up
        assert!(store.load().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_revoke() {
        let store = Arc::new(MemorySessionStore::new());
        let state = state_with(FakeWallet::default(), store.clone());
        state.connect().await.unwrap();

        state.revoke().await.unwrap();
        assert_eq!(state.current(), Session::unauthenticated());
        assert_eq!(store.load().unwrap(), None);
    }
}
