//! Wallet provider binding.
//!
//! # Data Flow
//! ```text
//! lifecycle::startup (config selects provider or none)
//!     → binding.rs (ProviderBinding over Option<dyn WalletProvider>)
//!     → session (connect / restore / disconnect)
//!     → blockchain::transaction (submit)
//! ```
//!
//! # Design Decisions
//! - Absence of a provider is a normal state, reported as `ProviderAbsent`
//! - Disconnect is best-effort and never fails the caller
//! - Providers are injected explicitly, never looked up from a global

pub mod binding;
pub mod types;

pub use binding::{ProviderBinding, WalletProvider};
pub use types::{WalletError, WalletResult};
