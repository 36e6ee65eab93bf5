//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check page definitions (methods, content types, routes)
//! - Detect duplicate pages
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HostConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{parse_method, HostConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Where the problem is (e.g., "pages[2].methods").
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("listener.bind_address", "not a socket address"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.policy.memoize_endpoints && config.policy.memo_capacity == 0 {
        errors.push(ValidationError::new(
            "policy.memo_capacity",
            "must be greater than 0 when memoization is enabled",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "not a socket address"));
    }

    let mut seen = HashSet::new();
    for (i, page) in config.pages.iter().enumerate() {
        let at = |field: &str| format!("pages[{}].{}", i, field);

        if !page.path.starts_with('/') {
            errors.push(ValidationError::new(at("path"), "must start with '/'"));
        }
        if !seen.insert((page.area.clone(), page.path.clone())) {
            errors.push(ValidationError::new(at("path"), format!("duplicate page {}", page.path)));
        }
        if !page.route.starts_with('/') {
            errors.push(ValidationError::new(at("route"), "must start with '/'"));
        }
        for method in &page.methods {
            if parse_method(method).is_err() {
                errors.push(ValidationError::new(at("methods"), format!("invalid method {:?}", method)));
            }
        }
        for content_type in &page.consumes {
            if !content_type.contains('/') {
                errors.push(ValidationError::new(
                    at("consumes"),
                    format!("invalid content type {:?}", content_type),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
