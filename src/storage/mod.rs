//! Content storage subsystem.
//!
//! # Data Flow
//! ```text
//! bytes → ipfs.rs put() → POST /api/v0/add → ContentId
//! ContentId → types.rs gateway_url() → <gateway>/<cid> → ipfs.rs fetch() → bytes
//! ```

pub mod ipfs;
pub mod types;

pub use ipfs::IpfsClient;
pub use types::{gateway_url, ContentId, ContentStore, StorageError, StorageResult};
