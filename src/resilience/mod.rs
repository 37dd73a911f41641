//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Read-only chain query:
//!     → retries.rs (retry transport errors and 5xx with backoff)
//!     → backoff.rs (exponential delay + jitter)
//!
//! Transaction submission:
//!     never retried here; the caller decides after SubmissionFailed
//! ```
//!
//! # Design Decisions
//! - Only idempotent reads are retried
//! - Jittered backoff prevents thundering herd
//! - Every external call still has its own deadline

pub mod backoff;
pub mod retries;
