//! Configuration schema definitions.
//!
//! This module defines the configuration structure of the page host.
//! All types derive Serde traits for deserialization from config files.

use axum::http::method::InvalidMethod;
use axum::http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pages::filters::FilterScope;

/// Root configuration for the page host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Materialization policy settings.
    pub policy: PolicyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Page definitions.
    pub pages: Vec<PageConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Materialization policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Reuse materialized endpoints while the compiled page is unchanged.
    pub memoize_endpoints: bool,

    /// Maximum number of memoized endpoints.
    pub memo_capacity: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            memoize_endpoints: true,
            memo_capacity: 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,
    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A page served by the host.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageConfig {
    /// Page path relative to the pages root (e.g., "/Orders/Detail.page").
    pub path: String,

    /// Optional area.
    #[serde(default)]
    pub area: Option<String>,

    /// Route template (e.g., "/orders/{id}").
    pub route: String,

    /// Route order (lower = preferred).
    #[serde(default)]
    pub order: i32,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Allowed HTTP methods; empty allows all.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Accepted request content types; empty accepts all.
    #[serde(default)]
    pub consumes: Vec<String>,

    #[serde(default)]
    pub filters: Vec<FilterConfig>,

    /// Free-form annotations exposed as endpoint metadata.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub suppress_link_generation: bool,

    #[serde(default)]
    pub suppress_path_matching: bool,

    /// Response body; `{name}` is replaced with the route value `name`.
    #[serde(default)]
    pub body: String,

    #[serde(default = "default_content_type")]
    pub content_type: String,
}

/// Parse a configured method name. Names are case-insensitive, so `"get"`
/// is `GET` rather than an extension method.
pub fn parse_method(name: &str) -> Result<Method, InvalidMethod> {
    name.trim().to_ascii_uppercase().parse()
}

fn default_content_type() -> String {
    "text/html; charset=utf-8".to_string()
}

/// A named filter applied to a page.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    pub name: String,

    #[serde(default)]
    pub order: i32,

    #[serde(default = "default_filter_scope")]
    pub scope: FilterScope,
}

fn default_filter_scope() -> FilterScope {
    FilterScope::Page
}
