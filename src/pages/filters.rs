//! Filter descriptors and their execution order.
//!
//! Filters themselves are opaque here; only their order and scope matter
//! when building endpoint metadata.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::pages::constraints::ActionConstraint;

/// Where a filter was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterScope {
    /// Registered for every page.
    Global,
    /// Declared on the page (or its model).
    Page,
    /// Declared on a single handler method.
    Handler,
}

impl FilterScope {
    /// Numeric precedence; lower sorts first.
    pub fn precedence(self) -> i32 {
        match self {
            FilterScope::Global => 10,
            FilterScope::Page => 20,
            FilterScope::Handler => 30,
        }
    }
}

/// A filter attached to a page.
pub trait PageFilter: fmt::Debug + Send + Sync {
    /// Name for logging.
    fn name(&self) -> &str;

    /// Filters that also act as action constraints expose the constraint here.
    fn as_constraint(&self) -> Option<&ActionConstraint> {
        None
    }
}

/// A filter with the order and scope it was registered with.
#[derive(Debug, Clone)]
pub struct FilterDescriptor {
    pub filter: Arc<dyn PageFilter>,
    pub order: i32,
    pub scope: FilterScope,
}

impl FilterDescriptor {
    pub fn new(filter: Arc<dyn PageFilter>, order: i32, scope: FilterScope) -> Self {
        Self { filter, order, scope }
    }
}

/// Total order over filter descriptors.
///
/// Primary key is `order` ascending; ties are broken by scope precedence
/// (global, then page, then handler). Equal keys compare equal, so a stable
/// sort keeps declaration order among them.
pub fn compare_filter_descriptors(a: &FilterDescriptor, b: &FilterDescriptor) -> Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| a.scope.precedence().cmp(&b.scope.precedence()))
}

/// Sort descriptors and unwrap the filters, in execution order.
pub fn ordered_filters(descriptors: &[FilterDescriptor]) -> Vec<Arc<dyn PageFilter>> {
    let mut sorted: Vec<&FilterDescriptor> = descriptors.iter().collect();
    sorted.sort_by(|a, b| compare_filter_descriptors(a, b));
    sorted.into_iter().map(|d| Arc::clone(&d.filter)).collect()
}
