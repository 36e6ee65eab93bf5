//! Materialized endpoint assembly.
//!
//! Append order, first entry first:
//! 1. metadata declared by the page
//! 2. the compiled descriptor
//! 3. filters, sorted by order then scope
//! 4. translated constraints
//! 5. link-generation suppression marker
//! 6. path-matching suppression marker
//!
//! Consumers take the first match, so the order is part of the contract.

use std::sync::Arc;

use crate::pages::descriptor::CompiledPageDescriptor;
use crate::pages::filters::ordered_filters;
use crate::policy::translate::translate_constraint;
use crate::routing::endpoint::{EndpointBuilder, RequestHandler, RouteEndpoint};
use crate::routing::metadata::MetadataItem;

/// Build the endpoint that replaces `template` for a compiled page.
///
/// Pattern, order and display name come from the template.
pub fn build_page_endpoint(
    template: &RouteEndpoint,
    descriptor: &Arc<CompiledPageDescriptor>,
    handler: Arc<dyn RequestHandler>,
) -> RouteEndpoint {
    let mut builder = EndpointBuilder::new(handler, template.pattern().clone(), template.order())
        .with_display_name(template.display_name().map(str::to_string));

    // The page marker is dropped so the result is never materialized again
    for item in &descriptor.endpoint_metadata {
        if !matches!(item, MetadataItem::Page(_)) {
            builder.push(item.clone());
        }
    }

    builder.push(MetadataItem::Descriptor(Arc::clone(descriptor)));

    for filter in ordered_filters(&descriptor.filters) {
        builder.push(MetadataItem::Filter(filter));
    }

    for constraint in &descriptor.constraints {
        if let Some(item) = translate_constraint(constraint, builder.metadata()) {
            builder.push(item);
        }
    }

    if descriptor.route_info.suppress_link_generation {
        builder.push(MetadataItem::SuppressLinkGeneration);
    }

    if descriptor.route_info.suppress_path_matching {
        builder.push(MetadataItem::SuppressMatching);
    }

    builder.build()
}
