//! Wallet session subsystem.
//!
//! # Data Flow
//! ```text
//! startup
//!     → state.rs restore(): provider account() → store.rs slot → watch channel
//! user action
//!     → state.rs connect()/disconnect() → provider + slot + watch channel
//! readers
//!     → subscribe() / current()
//! ```
//!
//! # Design Decisions
//! - The persisted slot is a hint, re-validated against the provider
//! - "Connecting" is transient and never stored
//! - Readers observe a change as soon as the mutating call returns

pub mod state;
pub mod store;

pub use state::{Session, SessionError, SessionState};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
