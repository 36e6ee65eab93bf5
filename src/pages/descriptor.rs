//! Compiled page descriptors.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::pages::constraints::ActionConstraint;
use crate::pages::filters::FilterDescriptor;
use crate::pages::reference::PageReference;
use crate::routing::metadata::MetadataItem;

/// Routing flags and template information for a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRouteInfo {
    /// Route template the page was registered under.
    pub template: String,
    pub order: i32,
    /// Route name used for link generation.
    pub name: Option<String>,
    /// Skip this page when generating links.
    pub suppress_link_generation: bool,
    /// Skip this page when matching incoming paths.
    pub suppress_path_matching: bool,
}

/// A fully resolved page, as produced by the loader.
///
/// Shared through `Arc`; identity of that `Arc` is what the endpoint memo
/// uses to detect reloads.
#[derive(Debug, Clone)]
pub struct CompiledPageDescriptor {
    pub page: PageReference,
    pub display_name: Option<String>,
    /// Metadata declared by the page itself (lowest precedence).
    pub endpoint_metadata: Vec<MetadataItem>,
    pub filters: Vec<FilterDescriptor>,
    pub constraints: Vec<ActionConstraint>,
    pub route_info: AttributeRouteInfo,
    /// Arbitrary compiled properties read by invokers.
    pub properties: BTreeMap<String, Value>,
}

impl CompiledPageDescriptor {
    /// Create an empty descriptor for a page.
    pub fn new(page: PageReference) -> Self {
        Self {
            page,
            display_name: None,
            endpoint_metadata: Vec::new(),
            filters: Vec::new(),
            constraints: Vec::new(),
            route_info: AttributeRouteInfo::default(),
            properties: BTreeMap::new(),
        }
    }

    /// String property lookup.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}
