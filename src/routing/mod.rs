//! Routing data structures between matching and execution.
//!
//! # Data Flow
//! ```text
//! Matcher output
//!     → candidate.rs (CandidateSet: endpoint + route values + score)
//!     → policy.rs (selector policies rewrite or reject candidates)
//!     → selector.rs (pick best valid candidate, run its handler)
//!
//! Endpoint construction:
//!     endpoint.rs (EndpointBuilder, append-only metadata)
//!     → metadata.rs (ordered MetadataItem list, first match wins)
//!     → RouteEndpoint (immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Endpoints are immutable; "changing" one means replacing it in a
//!   request-scoped candidate set
//! - Metadata kinds form a closed enum; lookups are pattern matches
//! - Deterministic: same candidates and metadata always select the same endpoint

pub mod candidate;
pub mod endpoint;
pub mod metadata;
pub mod policy;
pub mod selector;

pub use candidate::{CandidateSet, CandidateState, RouteValues};
pub use endpoint::{EndpointBuilder, RouteEndpoint, RoutePattern};
pub use metadata::{EndpointMetadata, MetadataItem};
pub use policy::{EndpointSelectorPolicy, PolicyError, SelectorContext};
pub use selector::{EndpointPipeline, RoutingError};
