//! Page materialization subsystem.
//!
//! # Data Flow
//! ```text
//! CandidateSet (some endpoints are deferred page templates)
//!     → materialize.rs (detect page marker, load descriptor)
//!     → memo.rs (reuse endpoint if descriptor instance unchanged)
//!     → assemble.rs (ordered metadata, per-page handler)
//!         → translate.rs (constraints → matcher metadata, dedup)
//!     → CandidateSet::replace_endpoint (route values kept)
//!
//! Later in the same pass:
//!     → fallback.rs (method, content type, raw constraint evaluation)
//! ```
//!
//! # Design Decisions
//! - Materialization runs before every other selector policy
//! - Translation only adds metadata; unknown constraints survive as raw items
//! - Memoization sits above assembly and is optional

pub mod assemble;
pub mod fallback;
pub mod materialize;
pub mod memo;
pub mod translate;

pub use materialize::{PageMaterializationPolicy, PAGE_MATERIALIZATION_ORDER};
