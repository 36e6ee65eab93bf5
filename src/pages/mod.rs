//! Page model and collaborator contracts.
//!
//! # Data Flow
//! ```text
//! PageReference (registered with a template)
//!     → loader.rs (PageLoader::load, cached compile)
//!     → CompiledPageDescriptor (metadata, filters, constraints, route info)
//!     → handler.rs (PageRequestHandler bound to the descriptor)
//!     → invoker.rs (InvokerFactory → PageInvoker → Response)
//! ```
//!
//! # Design Decisions
//! - Descriptors are shared via `Arc` and never mutated after compilation
//! - Constraints are a closed set of variants plus an opaque custom kind
//! - Loader and invoker factory are traits; the host supplies implementations

pub mod constraints;
pub mod descriptor;
pub mod filters;
pub mod handler;
pub mod invoker;
pub mod loader;
pub mod reference;

pub use descriptor::CompiledPageDescriptor;
pub use loader::{CachingPageLoader, LoadError, PageCompiler, PageLoader};
pub use reference::PageReference;
