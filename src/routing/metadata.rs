//! Endpoint metadata.
//!
//! # Responsibilities
//! - Define the closed set of metadata kinds endpoints can carry
//! - Preserve append order (consumers take the first match)
//! - Provide typed first-match lookups without runtime type inspection

use axum::http::Method;
use std::sync::Arc;

use crate::pages::constraints::ActionConstraint;
use crate::pages::descriptor::CompiledPageDescriptor;
use crate::pages::filters::PageFilter;
use crate::pages::reference::PageReference;

/// Dedicated method metadata understood by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMethodMetadata {
    pub methods: Vec<Method>,
}

impl HttpMethodMetadata {
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }
}

/// Dedicated content-type metadata understood by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumesMetadata {
    pub content_types: Vec<String>,
}

impl ConsumesMetadata {
    pub fn new(content_types: impl IntoIterator<Item = String>) -> Self {
        Self {
            content_types: content_types.into_iter().collect(),
        }
    }
}

/// Free-form key/value metadata declared by a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub key: String,
    pub value: String,
}

impl Annotation {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One metadata entry on an endpoint.
#[derive(Debug, Clone)]
pub enum MetadataItem {
    /// Marks a deferred page that has not been materialized yet.
    Page(PageReference),
    /// The compiled descriptor a materialized endpoint was built from.
    Descriptor(Arc<CompiledPageDescriptor>),
    Filter(Arc<dyn PageFilter>),
    HttpMethods(HttpMethodMetadata),
    Consumes(ConsumesMetadata),
    /// A constraint the matcher could not translate; evaluated by the fallback.
    Constraint(ActionConstraint),
    SuppressLinkGeneration,
    SuppressMatching,
    Annotation(Annotation),
}

impl MetadataItem {
    /// True if this entry is, or wraps, the given constraint.
    pub fn carries_constraint(&self, constraint: &ActionConstraint) -> bool {
        match self {
            MetadataItem::Constraint(c) => c == constraint,
            MetadataItem::Filter(f) => f.as_constraint() == Some(constraint),
            _ => false,
        }
    }
}

impl PartialEq for MetadataItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MetadataItem::Page(a), MetadataItem::Page(b)) => a == b,
            (MetadataItem::Descriptor(a), MetadataItem::Descriptor(b)) => Arc::ptr_eq(a, b),
            (MetadataItem::Filter(a), MetadataItem::Filter(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (MetadataItem::HttpMethods(a), MetadataItem::HttpMethods(b)) => a == b,
            (MetadataItem::Consumes(a), MetadataItem::Consumes(b)) => a == b,
            (MetadataItem::Constraint(a), MetadataItem::Constraint(b)) => a == b,
            (MetadataItem::SuppressLinkGeneration, MetadataItem::SuppressLinkGeneration) => true,
            (MetadataItem::SuppressMatching, MetadataItem::SuppressMatching) => true,
            (MetadataItem::Annotation(a), MetadataItem::Annotation(b)) => a == b,
            _ => false,
        }
    }
}

/// Ordered, read-only metadata of a built endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointMetadata {
    items: Vec<MetadataItem>,
}

impl EndpointMetadata {
    pub fn new(items: Vec<MetadataItem>) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetadataItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[MetadataItem] {
        &self.items
    }

    pub fn contains(&self, item: &MetadataItem) -> bool {
        self.items.contains(item)
    }

    /// First page marker, if this endpoint is a deferred page.
    pub fn page_reference(&self) -> Option<&PageReference> {
        self.items.iter().find_map(|item| match item {
            MetadataItem::Page(page) => Some(page),
            _ => None,
        })
    }

    pub fn descriptor(&self) -> Option<&Arc<CompiledPageDescriptor>> {
        self.items.iter().find_map(|item| match item {
            MetadataItem::Descriptor(d) => Some(d),
            _ => None,
        })
    }

    pub fn http_methods(&self) -> Option<&HttpMethodMetadata> {
        self.items.iter().find_map(|item| match item {
            MetadataItem::HttpMethods(m) => Some(m),
            _ => None,
        })
    }

    pub fn consumes(&self) -> Option<&ConsumesMetadata> {
        self.items.iter().find_map(|item| match item {
            MetadataItem::Consumes(c) => Some(c),
            _ => None,
        })
    }

    /// Raw constraints left for the fallback path, in metadata order.
    pub fn constraints(&self) -> impl Iterator<Item = &ActionConstraint> {
        self.items.iter().filter_map(|item| match item {
            MetadataItem::Constraint(c) => Some(c),
            _ => None,
        })
    }

    pub fn filters(&self) -> impl Iterator<Item = &Arc<dyn PageFilter>> {
        self.items.iter().filter_map(|item| match item {
            MetadataItem::Filter(f) => Some(f),
            _ => None,
        })
    }

    /// First annotation value with the given key.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.items.iter().find_map(|item| match item {
            MetadataItem::Annotation(a) if a.key == key => Some(a.value.as_str()),
            _ => None,
        })
    }

    pub fn suppresses_link_generation(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, MetadataItem::SuppressLinkGeneration))
    }

    pub fn suppresses_matching(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, MetadataItem::SuppressMatching))
    }
}

impl<'a> IntoIterator for &'a EndpointMetadata {
    type Item = &'a MetadataItem;
    type IntoIter = std::slice::Iter<'a, MetadataItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
