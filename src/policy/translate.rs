//! Constraint translation.
//!
//! Method and content-type constraints become dedicated matcher metadata so
//! the matcher can decide on them without the fallback path. Only the first
//! of each kind is translated; anything else is kept as a raw constraint.

use crate::pages::constraints::ActionConstraint;
use crate::routing::metadata::{ConsumesMetadata, HttpMethodMetadata, MetadataItem};

/// Translate one constraint given the metadata assembled so far.
///
/// Returns the item to append, or `None` when the constraint is already
/// present in `existing`. Never removes anything.
pub fn translate_constraint(constraint: &ActionConstraint, existing: &[MetadataItem]) -> Option<MetadataItem> {
    match constraint {
        ActionConstraint::HttpMethod(c) if !has_http_methods(existing) => Some(MetadataItem::HttpMethods(
            HttpMethodMetadata::new(c.methods().iter().cloned()),
        )),
        ActionConstraint::Consumes(c) if !has_consumes(existing) => Some(MetadataItem::Consumes(
            ConsumesMetadata::new(c.content_types().iter().cloned()),
        )),
        _ if existing.iter().any(|item| item.carries_constraint(constraint)) => None,
        _ => Some(MetadataItem::Constraint(constraint.clone())),
    }
}

fn has_http_methods(items: &[MetadataItem]) -> bool {
    items.iter().any(|item| matches!(item, MetadataItem::HttpMethods(_)))
}

fn has_consumes(items: &[MetadataItem]) -> bool {
    items.iter().any(|item| matches!(item, MetadataItem::Consumes(_)))
}
