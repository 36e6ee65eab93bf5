//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Page loads, materializations, dispatches produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Events carry the page and request id as fields, not in the message
//! - Metric recording is a no-op until a recorder is installed, so library
//!   users and tests pay nothing

pub mod logging;
pub mod metrics;
