//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stderr (fmt layer, filtered by RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every external boundary (hash, address, path)
//! - Private keys and auth secrets are never logged
//! - Metrics are cheap no-ops when no recorder is installed

pub mod logging;
pub mod metrics;
