//! Config-backed page compiler and invoker.
//!
//! # Responsibilities
//! - Compile configured pages into descriptors
//! - Render page bodies with route values substituted
//!
//! # Design Decisions
//! - The page catalogue is swapped atomically on reload; compiles already
//!   in flight finish against the catalogue they started with

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::{header, Response};
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::schema::parse_method;
use crate::config::PageConfig;
use crate::host::matcher::page_reference;
use crate::pages::constraints::{ActionConstraint, ConsumesConstraint, HttpMethodConstraint};
use crate::pages::descriptor::{AttributeRouteInfo, CompiledPageDescriptor};
use crate::pages::filters::{FilterDescriptor, PageFilter};
use crate::pages::invoker::{InvokeError, InvokerFactory, PageContext, PageInvoker};
use crate::pages::loader::{LoadError, PageCompiler};
use crate::pages::reference::PageReference;
use crate::routing::candidate::RouteValues;
use crate::routing::endpoint::HandlerFuture;
use crate::routing::metadata::{Annotation, MetadataItem};

/// A filter known only by name.
#[derive(Debug)]
pub struct NamedFilter {
    name: String,
}

impl PageFilter for NamedFilter {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Compiles pages from the host configuration.
pub struct StaticPageCompiler {
    pages: ArcSwap<HashMap<PageReference, PageConfig>>,
}

impl StaticPageCompiler {
    pub fn new(pages: &[PageConfig]) -> Self {
        Self {
            pages: ArcSwap::from_pointee(Self::catalogue(pages)),
        }
    }

    /// Replace the page catalogue.
    pub fn replace(&self, pages: &[PageConfig]) {
        self.pages.store(Arc::new(Self::catalogue(pages)));
    }

    fn catalogue(pages: &[PageConfig]) -> HashMap<PageReference, PageConfig> {
        pages
            .iter()
            .map(|page| (page_reference(page), page.clone()))
            .collect()
    }

    fn build(page: &PageReference, config: &PageConfig) -> Result<CompiledPageDescriptor, LoadError> {
        let mut descriptor = CompiledPageDescriptor::new(page.clone());
        descriptor.display_name = config.display_name.clone();

        descriptor.endpoint_metadata = config
            .tags
            .iter()
            .map(|(k, v)| MetadataItem::Annotation(Annotation::new(k.as_str(), v.as_str())))
            .collect();

        descriptor.filters = config
            .filters
            .iter()
            .map(|f| {
                let filter = Arc::new(NamedFilter { name: f.name.clone() });
                FilterDescriptor::new(filter, f.order, f.scope)
            })
            .collect();

        if !config.methods.is_empty() {
            let methods = config
                .methods
                .iter()
                .map(|m| {
                    parse_method(m).map_err(|_| LoadError::Compilation {
                        page: page.to_string(),
                        message: format!("invalid method {:?}", m),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            descriptor
                .constraints
                .push(ActionConstraint::HttpMethod(HttpMethodConstraint::new(methods)));
        }

        if !config.consumes.is_empty() {
            descriptor
                .constraints
                .push(ActionConstraint::Consumes(ConsumesConstraint::new(config.consumes.iter().cloned())));
        }

        descriptor.route_info = AttributeRouteInfo {
            template: config.route.clone(),
            order: config.order,
            name: config.display_name.clone(),
            suppress_link_generation: config.suppress_link_generation,
            suppress_path_matching: config.suppress_path_matching,
        };

        descriptor
            .properties
            .insert("body".to_string(), Value::String(config.body.clone()));
        descriptor
            .properties
            .insert("content_type".to_string(), Value::String(config.content_type.clone()));

        Ok(descriptor)
    }
}

impl PageCompiler for StaticPageCompiler {
    fn compile<'a>(&'a self, page: &'a PageReference) -> BoxFuture<'a, Result<CompiledPageDescriptor, LoadError>> {
        let pages = self.pages.load_full();
        Box::pin(async move {
            let config = pages
                .get(page)
                .ok_or_else(|| LoadError::NotFound(page.to_string()))?;
            Self::build(page, config)
        })
    }
}

/// Substitute `{name}` placeholders with route values.
pub fn render_body(template: &str, values: &RouteValues) -> String {
    values.iter().fold(template.to_string(), |body, (key, value)| {
        body.replace(&format!("{{{}}}", key), value)
    })
}

/// Invoker factory for config-backed pages.
#[derive(Debug, Default)]
pub struct StaticInvokerFactory;

struct StaticInvoker {
    context: PageContext,
}

impl PageInvoker for StaticInvoker {
    fn invoke(self: Box<Self>) -> HandlerFuture {
        let descriptor = &self.context.descriptor;
        let body = render_body(
            descriptor.property_str("body").unwrap_or_default(),
            &self.context.route_values,
        );
        let content_type = descriptor
            .property_str("content_type")
            .unwrap_or("text/plain")
            .to_string();
        let page = descriptor.page.to_string();

        Box::pin(async move {
            Response::builder()
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .map_err(|e| InvokeError::Page {
                    page,
                    message: e.to_string(),
                })
        })
    }
}

impl InvokerFactory for StaticInvokerFactory {
    fn create_invoker(&self, context: PageContext) -> Result<Box<dyn PageInvoker>, InvokeError> {
        Ok(Box::new(StaticInvoker { context }))
    }
}
