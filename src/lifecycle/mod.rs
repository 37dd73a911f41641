//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → node client → provider binding → session
//!         → submitter → storage → HealthVault → session restore
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then clients, then session
//! - Startup does no network I/O until restore

pub mod startup;

pub use startup::{assemble, start, StartupError, VaultRuntime};
