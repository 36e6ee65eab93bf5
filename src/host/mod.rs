//! Reference page host.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     HostConfig.pages
//!     → matcher.rs (one deferred template per page)
//!     → static_pages.rs (compiler catalogue)
//!
//! Request:
//!     Axum fallback handler
//!     → matcher.rs (ranked candidates)
//!     → EndpointPipeline (materialize, method, consumes, constraint fallback)
//!     → selected endpoint handler → StaticInvoker
//! ```
//!
//! # Design Decisions
//! - The matcher here is a minimal stand-in; real deployments plug in their own
//! - Reload swaps whole tables, never patches them

pub mod matcher;
pub mod server;
pub mod static_pages;

pub use server::PageHost;
