//! Health-record service.
//!
//! # Data Flow
//! ```text
//! upload:  bytes → storage put() → ContentId → add_record(patient, cid) → confirmed
//! list:    HealthRecord resource → cid list → gateway links
//! access:  access.rs begin() → grant/revoke submit → confirm | rollback | unverified
//!          has_access view → access.rs record_observed()
//! ```
//!
//! # Design Decisions
//! - Writes need an authenticated session; reads take an explicit address
//! - A missing `HealthRecord` resource means "no records yet", not an error
//! - The access mirror never outranks the chain: a fresh view call wins

pub mod access;
pub mod service;
pub mod types;

pub use access::{AccessBook, AccessEntry, GrantState};
pub use service::HealthVault;
pub use types::{RecordLink, RecordReceipt, VaultError, VaultResult};
