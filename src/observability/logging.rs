//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Let `RUST_LOG` override the configured level
//!
//! # Design Decisions
//! - Uses the tracing crate; the library never installs a subscriber itself

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a given base level.
pub fn default_directive(level: &str) -> String {
    format!("page_materializer={level},tower_http={level}")
}

/// Install the global subscriber.
///
/// Returns an error if a subscriber was already installed.
pub fn init_tracing(level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(level).into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
