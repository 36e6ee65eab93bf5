//! Page invocation contracts.
//!
//! The invoker factory is supplied by the host application; it turns a
//! per-request context into something that produces the response.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use thiserror::Error;

use crate::pages::descriptor::CompiledPageDescriptor;
use crate::routing::candidate::RouteValues;
use crate::routing::endpoint::HandlerFuture;

/// Errors raised while executing a page.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// A registration-time template was asked to serve a request.
    #[error("endpoint {0} is a deferred page and was never materialized")]
    NotMaterialized(String),

    /// The invoker factory could not build an invoker.
    #[error("failed to create invoker for {page}: {message}")]
    Factory { page: String, message: String },

    /// Page logic failed.
    #[error("page {page} failed: {message}")]
    Page { page: String, message: String },
}

impl IntoResponse for InvokeError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Page invocation failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Page execution failed").into_response()
    }
}

/// Everything an invoker needs for one request.
#[derive(Debug)]
pub struct PageContext {
    pub request: Request<Body>,
    pub route_values: RouteValues,
    pub descriptor: Arc<CompiledPageDescriptor>,
}

/// Executes one page request.
pub trait PageInvoker: Send {
    fn invoke(self: Box<Self>) -> HandlerFuture;
}

/// Creates invokers from per-request contexts.
///
/// Shared across requests; implementations must be safe for concurrent use.
pub trait InvokerFactory: Send + Sync {
    fn create_invoker(&self, context: PageContext) -> Result<Box<dyn PageInvoker>, InvokeError>;
}
