//! Template matching for the page host.
//!
//! # Responsibilities
//! - Register one deferred page template per configured page
//! - Produce a ranked candidate set for a request path
//!
//! # Design Decisions
//! - Literal and `{name}` segments only; no regex
//! - Literal segments are case-sensitive
//! - Candidates are scored by endpoint order and kept sorted by score

use std::sync::Arc;

use crate::config::PageConfig;
use crate::pages::reference::PageReference;
use crate::routing::candidate::{CandidateSet, CandidateState, RouteValues};
use crate::routing::endpoint::{EndpointBuilder, RouteEndpoint, RoutePattern};

/// Page reference for a configured page.
pub fn page_reference(page: &PageConfig) -> PageReference {
    let reference = PageReference::new(page.path.as_str());
    match &page.area {
        Some(area) => reference.with_area(area.as_str()),
        None => reference,
    }
}

/// Immutable table of registered templates.
#[derive(Debug, Default)]
pub struct TemplateMatcher {
    routes: Vec<Arc<RouteEndpoint>>,
}

impl TemplateMatcher {
    pub fn new(routes: Vec<Arc<RouteEndpoint>>) -> Self {
        Self { routes }
    }

    /// Register a deferred template for each page.
    pub fn from_pages(pages: &[PageConfig]) -> Self {
        let routes = pages
            .iter()
            .map(|page| {
                let template = EndpointBuilder::page_template(page_reference(page), page.route.as_str(), page.order)
                    .with_display_name(page.display_name.clone())
                    .build();
                Arc::new(template)
            })
            .collect();
        Self::new(routes)
    }

    pub fn routes(&self) -> &[Arc<RouteEndpoint>] {
        &self.routes
    }

    /// Candidates whose pattern matches `path`, best first.
    pub fn match_path(&self, path: &str) -> CandidateSet {
        let mut candidates: Vec<CandidateState> = self
            .routes
            .iter()
            .filter_map(|endpoint| {
                match_pattern(endpoint.pattern(), path).map(|values| CandidateState {
                    endpoint: Arc::clone(endpoint),
                    values,
                    score: endpoint.order(),
                })
            })
            .collect();
        candidates.sort_by_key(|c| c.score);
        CandidateSet::new(candidates)
    }
}

/// Match a path against a pattern, capturing `{name}` segments.
pub fn match_pattern(pattern: &RoutePattern, path: &str) -> Option<RouteValues> {
    let mut values = RouteValues::new();
    let mut path_segments = path.split('/').filter(|s| !s.is_empty());

    for expected in pattern.segments() {
        let actual = path_segments.next()?;
        match expected.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => values.insert(name, actual),
            None if expected == actual => {}
            None => return None,
        }
    }

    if path_segments.next().is_some() {
        return None;
    }
    Some(values)
}
