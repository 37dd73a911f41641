//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment variable (private key), config (node URL)
//!     → wallet.rs (local provider: key loading, approval, signing)
//!     → client.rs (REST reads with timeouts and retries)
//!     → transaction.rs (submit through provider, poll until committed)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{ChainReader, RestClient};
pub use transaction::TransactionSubmitter;
pub use types::{
    AccountAddress, ChainError, ChainResult, SubmitError, TransactionPayload, TransactionResult, TxStatus,
};
pub use wallet::LocalWallet;
