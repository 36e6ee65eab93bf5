//! Candidate selection and dispatch.
//!
//! # Responsibilities
//! - Run applicable selector policies in order
//! - Pick the single best valid candidate
//! - Hand the request, with its route values, to the chosen endpoint
//!
//! # Design Decisions
//! - Lowest score wins; several valid candidates sharing the lowest score
//!   is an ambiguity error, not a coin toss
//! - Endpoints that suppress path matching are never selected
//! - Route values travel to the handler in the request extensions

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use thiserror::Error;

use crate::observability::metrics;
use crate::routing::candidate::CandidateSet;
use crate::routing::policy::{EndpointSelectorPolicy, PolicyError, SelectorContext};

/// Errors raised while selecting an endpoint.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("request matched multiple endpoints: {}", .0.join(", "))]
    AmbiguousMatch(Vec<String>),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl IntoResponse for RoutingError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Endpoint selection failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Endpoint selection failed").into_response()
    }
}

/// Ordered selector policies followed by best-candidate selection.
pub struct EndpointPipeline {
    policies: Vec<Arc<dyn EndpointSelectorPolicy>>,
}

impl EndpointPipeline {
    /// Policies are sorted by `order`; equal orders keep the given order.
    pub fn new(mut policies: Vec<Arc<dyn EndpointSelectorPolicy>>) -> Self {
        policies.sort_by_key(|p| p.order());
        Self { policies }
    }

    /// Policy names in execution order.
    pub fn policy_names(&self) -> Vec<&'static str> {
        self.policies.iter().map(|p| p.name()).collect()
    }

    /// Run policies and return the index of the selected candidate.
    pub async fn select(
        &self,
        request: &Parts,
        ctx: &SelectorContext,
        candidates: &mut CandidateSet,
    ) -> Result<Option<usize>, RoutingError> {
        for policy in &self.policies {
            if policy.applies_to(candidates) {
                tracing::trace!(policy = policy.name(), request_id = %ctx.request_id(), "Applying selector policy");
                policy.apply(request, ctx, candidates).await?;
            }
        }
        select_best(candidates)
    }

    /// Select an endpoint and run it.
    pub async fn dispatch(
        &self,
        request: Request<Body>,
        mut candidates: CandidateSet,
        ctx: SelectorContext,
    ) -> Response {
        let (parts, body) = request.into_parts();

        let selected = match self.select(&parts, &ctx, &mut candidates).await {
            Ok(selected) => selected,
            Err(e) => {
                metrics::record_request(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
                return e.into_response();
            }
        };

        let Some(candidate) = selected.and_then(|index| candidates.get(index)) else {
            tracing::debug!(request_id = %ctx.request_id(), path = %parts.uri.path(), "No endpoint selected");
            metrics::record_request(StatusCode::NOT_FOUND.as_u16());
            return (StatusCode::NOT_FOUND, "No matching page").into_response();
        };

        tracing::debug!(
            request_id = %ctx.request_id(),
            endpoint = %candidate.endpoint,
            "Endpoint selected"
        );

        let mut request = Request::from_parts(parts, body);
        request.extensions_mut().insert(candidate.values.clone());

        let response = match candidate.endpoint.handler().handle(request).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        };
        metrics::record_request(response.status().as_u16());
        response
    }
}

/// Index of the single best valid candidate.
pub fn select_best(candidates: &CandidateSet) -> Result<Option<usize>, RoutingError> {
    let mut best: Option<(usize, i32)> = None;
    let mut tied: Vec<usize> = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        if !candidates.is_valid(index) || candidate.endpoint.metadata().suppresses_matching() {
            continue;
        }
        match best {
            Some((_, score)) if candidate.score > score => {}
            Some((_, score)) if candidate.score == score => tied.push(index),
            _ => {
                best = Some((index, candidate.score));
                tied.clear();
            }
        }
    }

    match best {
        Some((index, _)) if !tied.is_empty() => {
            let names = std::iter::once(index)
                .chain(tied)
                .filter_map(|i| candidates.get(i))
                .map(|c| c.endpoint.to_string())
                .collect();
            Err(RoutingError::AmbiguousMatch(names))
        }
        Some((index, _)) => Ok(Some(index)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::candidate::{CandidateState, RouteValues};
    use crate::routing::endpoint::EndpointBuilder;
    use crate::routing::metadata::MetadataItem;

    fn candidate(pattern: &str, score: i32) -> CandidateState {
        CandidateState {
            endpoint: Arc::new(EndpointBuilder::deferred(pattern, score).build()),
            values: RouteValues::new(),
            score,
        }
    }

    #[test]
    fn test_lowest_score_wins() {
        let set = CandidateSet::new(vec![candidate("/b", 2), candidate("/a", 1), candidate("/c", 3)]);
        assert_eq!(select_best(&set).unwrap(), Some(1));
    }

    #[test]
    fn test_invalid_skipped() {
        let mut set = CandidateSet::new(vec![candidate("/a", 1), candidate("/b", 2)]);
        set.set_validity(0, false);
        assert_eq!(select_best(&set).unwrap(), Some(1));

        set.set_validity(1, false);
        assert_eq!(select_best(&set).unwrap(), None);
    }

    #[test]
    fn test_ambiguous() {
        let set = CandidateSet::new(vec![candidate("/a", 1), candidate("/b", 1)]);
        match select_best(&set) {
            Err(RoutingError::AmbiguousMatch(names)) => assert_eq!(names, vec!["/a", "/b"]),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_suppressed_matching_skipped() {
        let mut builder = EndpointBuilder::deferred("/hidden", 0);
        builder.push(MetadataItem::SuppressMatching);
        let hidden = CandidateState {
            endpoint: Arc::new(builder.build()),
            values: RouteValues::new(),
            score: 0,
        };
        let set = CandidateSet::new(vec![hidden, candidate("/shown", 1)]);
        assert_eq!(select_best(&set).unwrap(), Some(1));
    }
}
