//! Endpoints and the builder that assembles them.
//!
//! # Responsibilities
//! - Represent an immutable endpoint: pattern, order, display name,
//!   ordered metadata and a request handler
//! - Accumulate metadata in append order before freezing it
//!
//! # Design Decisions
//! - Endpoints are shared via `Arc` and never mutated after `build`
//! - Registration-time page templates get a handler that refuses to run;
//!   only materialized endpoints can serve requests

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

use crate::pages::invoker::InvokeError;
use crate::pages::reference::PageReference;
use crate::routing::metadata::{EndpointMetadata, MetadataItem};

/// Future returned by endpoint handlers.
pub type HandlerFuture = BoxFuture<'static, Result<Response<Body>, InvokeError>>;

/// Runs a request against an endpoint.
pub trait RequestHandler: Send + Sync {
    fn handle(&self, request: Request<Body>) -> HandlerFuture;
}

/// Handler of a page template that was never materialized.
#[derive(Debug, Clone)]
pub struct DeferredPageHandler {
    pattern: String,
}

impl DeferredPageHandler {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl RequestHandler for DeferredPageHandler {
    fn handle(&self, _request: Request<Body>) -> HandlerFuture {
        let pattern = self.pattern.clone();
        Box::pin(async move { Err(InvokeError::NotMaterialized(pattern)) })
    }
}

/// A route pattern as registered (e.g., "/orders/{id}").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePattern(String);

impl RoutePattern {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, ignoring leading/trailing slashes.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An immutable routing endpoint.
pub struct RouteEndpoint {
    pattern: RoutePattern,
    order: i32,
    display_name: Option<String>,
    metadata: EndpointMetadata,
    handler: Arc<dyn RequestHandler>,
}

impl RouteEndpoint {
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Lower order means higher priority.
    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn metadata(&self) -> &EndpointMetadata {
        &self.metadata
    }

    pub fn handler(&self) -> &Arc<dyn RequestHandler> {
        &self.handler
    }

    /// True if this endpoint still needs materialization.
    pub fn is_deferred_page(&self) -> bool {
        self.metadata.page_reference().is_some()
    }
}

impl fmt::Debug for RouteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEndpoint")
            .field("pattern", &self.pattern)
            .field("order", &self.order)
            .field("display_name", &self.display_name)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RouteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.pattern),
        }
    }
}

/// Accumulates metadata and produces a [`RouteEndpoint`].
///
/// Metadata is append-only; `build` freezes it in the order it was pushed.
pub struct EndpointBuilder {
    pattern: RoutePattern,
    order: i32,
    display_name: Option<String>,
    metadata: Vec<MetadataItem>,
    handler: Arc<dyn RequestHandler>,
}

impl EndpointBuilder {
    pub fn new(handler: Arc<dyn RequestHandler>, pattern: RoutePattern, order: i32) -> Self {
        Self {
            pattern,
            order,
            display_name: None,
            metadata: Vec::new(),
            handler,
        }
    }

    /// Builder for an endpoint whose handler refuses to run.
    pub fn deferred(pattern: impl Into<String>, order: i32) -> Self {
        let pattern = RoutePattern::new(pattern);
        let handler = Arc::new(DeferredPageHandler::new(pattern.as_str()));
        Self::new(handler, pattern, order)
    }

    /// Builder for a registration-time page template.
    pub fn page_template(page: PageReference, pattern: impl Into<String>, order: i32) -> Self {
        let mut builder = Self::deferred(pattern, order);
        builder.push(MetadataItem::Page(page));
        builder
    }

    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name;
        self
    }

    pub fn push(&mut self, item: MetadataItem) {
        self.metadata.push(item);
    }

    /// Metadata accumulated so far.
    pub fn metadata(&self) -> &[MetadataItem] {
        &self.metadata
    }

    pub fn build(self) -> RouteEndpoint {
        RouteEndpoint {
            pattern: self.pattern,
            order: self.order,
            display_name: self.display_name,
            metadata: EndpointMetadata::new(self.metadata),
            handler: self.handler,
        }
    }
}
