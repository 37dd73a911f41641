//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → VaultConfig (validated, immutable)
//!     → lifecycle::startup wires providers and clients from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Secrets (wallet key) never live in the file, only in the environment

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    ChainConfig, ObservabilityConfig, ProviderKind, RetryConfig, SessionConfig, StorageConfig,
    SubmitterConfig, VaultConfig, WalletConfig,
};
