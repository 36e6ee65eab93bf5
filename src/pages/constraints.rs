//! Action constraints declared by pages.
//!
//! # Design Decisions
//! - Closed variant set: method and content-type restrictions are known
//!   kinds, anything else is `Custom` and carries its own evaluator
//! - Equality is explicit: known kinds compare structurally, custom
//!   constraints compare by identity of the shared object

use axum::http::request::Parts;
use axum::http::{header, Method};
use std::fmt;
use std::sync::Arc;

use crate::routing::candidate::RouteValues;

/// What a constraint evaluator gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintContext<'a> {
    pub request: &'a Parts,
    pub route_values: &'a RouteValues,
}

/// A constraint the generic matcher cannot express natively.
///
/// Evaluated only by the fallback path.
pub trait CustomConstraint: fmt::Debug + Send + Sync {
    /// Evaluation order among custom constraints (lower runs first).
    fn order(&self) -> i32 {
        0
    }

    /// Returns true if the request is acceptable to this constraint.
    fn accept(&self, ctx: &ConstraintContext<'_>) -> bool;
}

/// Restricts an action to a set of HTTP methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMethodConstraint {
    methods: Vec<Method>,
}

impl HttpMethodConstraint {
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// An empty method set accepts everything.
    pub fn accepts(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

/// Restricts an action to requests with one of the given content types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumesConstraint {
    content_types: Vec<String>,
}

impl ConsumesConstraint {
    pub fn new<I, S>(content_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            content_types: content_types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn content_types(&self) -> &[String] {
        &self.content_types
    }
}

/// A constraint attached to a compiled page.
#[derive(Debug, Clone)]
pub enum ActionConstraint {
    HttpMethod(HttpMethodConstraint),
    Consumes(ConsumesConstraint),
    Custom(Arc<dyn CustomConstraint>),
}

impl ActionConstraint {
    /// Evaluate the constraint directly against a request.
    pub fn accept(&self, ctx: &ConstraintContext<'_>) -> bool {
        match self {
            ActionConstraint::HttpMethod(c) => c.accepts(&ctx.request.method),
            ActionConstraint::Consumes(c) => {
                let content_type = ctx
                    .request
                    .headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok());
                match content_type {
                    Some(ct) => content_type_matches(c.content_types(), ct),
                    None => false,
                }
            }
            ActionConstraint::Custom(c) => c.accept(ctx),
        }
    }

    /// Evaluation order. Known kinds run before custom ones.
    pub fn order(&self) -> i32 {
        match self {
            ActionConstraint::HttpMethod(_) | ActionConstraint::Consumes(_) => i32::MIN,
            ActionConstraint::Custom(c) => c.order(),
        }
    }
}

impl PartialEq for ActionConstraint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ActionConstraint::HttpMethod(a), ActionConstraint::HttpMethod(b)) => a == b,
            (ActionConstraint::Consumes(a), ActionConstraint::Consumes(b)) => a == b,
            (ActionConstraint::Custom(a), ActionConstraint::Custom(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

/// Compare a request content type against an accepted list.
///
/// Parameters (`; charset=...`) are ignored, and `type/*` entries match any
/// subtype.
pub fn content_type_matches(accepted: &[String], content_type: &str) -> bool {
    let media = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    accepted.iter().any(|candidate| {
        let candidate = candidate.trim().to_ascii_lowercase();
        match candidate.strip_suffix("/*") {
            Some(prefix) => media
                .split_once('/')
                .map(|(ty, _)| ty == prefix)
                .unwrap_or(false),
            None => candidate == "*/*" || candidate == media,
        }
    })
}
