//! Deferred page materialization for request routing.

pub mod config;
pub mod host;
pub mod observability;
pub mod pages;
pub mod policy;
pub mod routing;

pub use config::HostConfig;
pub use host::PageHost;
pub use policy::PageMaterializationPolicy;
