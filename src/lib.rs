//! CuraVault client library
//!
//! Wallet session handling, transaction submission and read-only chain
//! queries for the `health_record` Move module, plus IPFS content storage.

// Core subsystems
pub mod blockchain;
pub mod config;
pub mod provider;
pub mod session;
pub mod storage;

// Application layer
pub mod lifecycle;
pub mod records;

// Cross-cutting concerns
pub mod observability;
pub mod resilience;

pub use config::schema::VaultConfig;
pub use lifecycle::{start, VaultRuntime};
pub use records::{HealthVault, VaultError};
