//! Local wallet provider and transaction signing.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use serde_json::{json, Value};
use sha3::{Digest, Sha3_256};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::blockchain::client::RestClient;
use crate::blockchain::types::{AccountAddress, TransactionPayload};
use crate::config::SubmitterConfig;
use crate::provider::{WalletError, WalletProvider, WalletResult};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "CURAVAULT_WALLET_PRIVATE_KEY";

/// Prefix some tools put in front of exported Ed25519 keys.
const KEY_PREFIX: &str = "ed25519-priv-";

/// Scheme byte appended to the public key when deriving an auth key.
const ED25519_SCHEME: u8 = 0x00;

/// Something the user must approve.
#[derive(Debug)]
pub enum ApprovalRequest<'a> {
    Connect { address: &'a AccountAddress },
    Sign { payload: &'a TransactionPayload },
}

/// Decides approval prompts. Returning false rejects the request.
pub type ApprovalHook = Arc<dyn Fn(&ApprovalRequest<'_>) -> bool + Send + Sync>;

/// Approves everything.
pub fn auto_approve() -> ApprovalHook {
    Arc::new(|_: &ApprovalRequest<'_>| true)
}

/// Gas and expiry attached to locally signed transactions.
#[derive(Debug, Clone, Copy)]
struct GasSettings {
    max_gas_amount: u64,
    gas_unit_price: u64,
    expiration_secs: u64,
}

/// An in-process wallet holding one Ed25519 key.
pub struct LocalWallet {
    signing_key: SigningKey,
    address: AccountAddress,
    node: RestClient,
    gas: GasSettings,
    authorized: AtomicBool,
    /// Marker file remembering the authorization across restarts.
    authorization_path: Option<PathBuf>,
    approve: ApprovalHook,
}

/// Derive the account address for an Ed25519 public key.
pub fn derive_address(public_key: &VerifyingKey) -> AccountAddress {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key.as_bytes());
    hasher.update([ED25519_SCHEME]);
    AccountAddress::new(hasher.finalize().into())
}

/// Generate a fresh private key, hex encoded.
pub fn generate_private_key_hex() -> String {
    let key = SigningKey::generate(&mut OsRng);
    format!("0x{}", hex::encode(key.to_bytes()))
}

/// Accepts an optional `ed25519-priv-` and/or `0x` prefix.
fn parse_private_key(private_key_hex: &str) -> WalletResult<SigningKey> {
    let key_hex = private_key_hex.trim();
    let key_hex = key_hex.strip_prefix(KEY_PREFIX).unwrap_or(key_hex);
    let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

    let mut secret = [0u8; SECRET_KEY_LENGTH];
    hex::decode_to_slice(key_hex, &mut secret)
        .map_err(|e| WalletError::Provider(format!("Invalid private key format: {}", e)))?;
    Ok(SigningKey::from_bytes(&secret))
}

/// Account address controlled by a hex-encoded private key.
pub fn address_for_private_key(private_key_hex: &str) -> WalletResult<AccountAddress> {
    parse_private_key(private_key_hex).map(|key| derive_address(&key.verifying_key()))
}

impl LocalWallet {
    /// Create a wallet from a hex-encoded private key string.
    pub fn from_private_key(
        private_key_hex: &str,
        node: RestClient,
        submitter: &SubmitterConfig,
    ) -> WalletResult<Self> {
        let signing_key = parse_private_key(private_key_hex)?;
        let address = derive_address(&signing_key.verifying_key());

        tracing::info!(address = %address, "Local wallet initialized");

        Ok(Self {
            signing_key,
            address,
            node,
            gas: GasSettings {
                max_gas_amount: submitter.max_gas_amount,
                gas_unit_price: submitter.gas_unit_price,
                expiration_secs: submitter.expiration_secs,
            },
            authorized: AtomicBool::new(false),
            authorization_path: None,
            approve: auto_approve(),
        })
    }

    /// Load a wallet from the environment variable `var`.
    ///
    /// An unset variable is not an error: it means no provider is injected.
    pub fn from_env(var: &str, node: RestClient, submitter: &SubmitterConfig) -> WalletResult<Option<Self>> {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Self::from_private_key(&key, node, submitter).map(Some),
            _ => {
                tracing::debug!(var, "No wallet key in environment");
                Ok(None)
            }
        }
    }

    /// Remember authorization in `path`. A marker already holding this
    /// wallet's address restores the authorized state.
    pub fn with_authorization_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let remembered = fs::read_to_string(&path)
            .ok()
            .and_then(|s| s.trim().parse::<AccountAddress>().ok());
        self.authorized
            .store(remembered == Some(self.address), Ordering::SeqCst);
        self.authorization_path = Some(path);
        self
    }

    pub fn with_approval(mut self, hook: ApprovalHook) -> Self {
        self.approve = hook;
        self
    }

    /// Get the wallet's address.
    pub fn address(&self) -> AccountAddress {
        self.address
    }

    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.verifying_key().as_bytes()))
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    fn persist_authorization(&self, authorized: bool) -> WalletResult<()> {
        let Some(path) = &self.authorization_path else {
            return Ok(());
        };

        let result = if authorized {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).ok();
            }
            fs::write(path, self.address.to_hex())
        } else {
            match fs::remove_file(path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            }
        };
        result.map_err(|e| WalletError::Provider(format!("Failed to update authorization: {}", e)))
    }

    /// Build the unsigned transaction body the node encodes and accepts.
    fn unsigned_transaction(&self, sequence_number: u64, payload: &TransactionPayload) -> WalletResult<Value> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let payload = serde_json::to_value(payload)
            .map_err(|e| WalletError::SubmissionFailed(format!("Failed to encode payload: {}", e)))?;

        Ok(json!({
            "sender": self.address.to_hex(),
            "sequence_number": sequence_number.to_string(),
            "max_gas_amount": self.gas.max_gas_amount.to_string(),
            "gas_unit_price": self.gas.gas_unit_price.to_string(),
            "expiration_timestamp_secs": (now + self.gas.expiration_secs).to_string(),
            "payload": payload,
        }))
    }

    /// Sign a node-encoded signing message.
    pub fn sign_message(&self, message: &[u8]) -> String {
        format!("0x{}", hex::encode(self.signing_key.sign(message).to_bytes()))
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn connect(&self) -> WalletResult<AccountAddress> {
        if !(self.approve)(&ApprovalRequest::Connect { address: &self.address }) {
            return Err(WalletError::UserRejected("authorization declined".to_string()));
        }
        self.persist_authorization(true)?;
        self.authorized.store(true, Ordering::SeqCst);
        Ok(self.address)
    }

    async fn disconnect(&self) -> WalletResult<()> {
        self.authorized.store(false, Ordering::SeqCst);
        self.persist_authorization(false)
    }

    async fn account(&self) -> WalletResult<Option<AccountAddress>> {
        Ok(self.is_authorized().then_some(self.address))
    }

    async fn sign_and_submit_transaction(&self, payload: &TransactionPayload) -> WalletResult<String> {
        if !self.is_authorized() {
            return Err(WalletError::SigningRejected(
                "account has not authorized this client".to_string(),
            ));
        }
        if !(self.approve)(&ApprovalRequest::Sign { payload }) {
            return Err(WalletError::SigningRejected("signature declined".to_string()));
        }

        let sequence_number = self
            .node
            .account_sequence_number(&self.address)
            .await
            .map_err(|e| WalletError::SubmissionFailed(e.to_string()))?;

        let mut transaction = self.unsigned_transaction(sequence_number, payload)?;
        let message = self
            .node
            .encode_submission(&transaction)
            .await
            .map_err(|e| WalletError::SubmissionFailed(e.to_string()))?;

        transaction["signature"] = json!({
            "type": "ed25519_signature",
            "public_key": self.public_key_hex(),
            "signature": self.sign_message(&message),
        });

        tracing::debug!(
            sender = %self.address,
            sequence_number,
            function = payload.function(),
            "Signed transaction"
        );

        self.node
            .submit_signed(&transaction)
            .await
            .map_err(|e| WalletError::SubmissionFailed(e.to_string()))
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .field("authorized", &self.is_authorized())
            .finish()
    }
}
