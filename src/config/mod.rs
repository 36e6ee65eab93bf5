//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, apply CLI overrides)
//!     → validation.rs (semantic checks)
//!     → HostConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs sees an event for the file in its directory
//!     → debounce, skip if content unchanged
//!     → loader.rs loads new config with the same overrides
//!     → validation.rs validates
//!     → host swaps route table and page catalogue, clears page cache
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All sections have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::FilterConfig;
pub use schema::HostConfig;
pub use schema::PageConfig;
pub use schema::PolicyConfig;
