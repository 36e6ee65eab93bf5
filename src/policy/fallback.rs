//! Consumers of materialized metadata.
//!
//! # Responsibilities
//! - Reject candidates whose method metadata excludes the request method
//! - Reject candidates whose content-type metadata excludes the request body
//! - Evaluate raw constraints the matcher could not express natively
//!
//! # Design Decisions
//! - Rejection only flips validity; endpoints and route values are untouched
//! - Raw constraints run in their declared order; all must accept

use axum::http::header;
use axum::http::request::Parts;
use futures_util::future::BoxFuture;

use crate::pages::constraints::{content_type_matches, ActionConstraint, ConstraintContext};
use crate::routing::candidate::CandidateSet;
use crate::routing::policy::{EndpointSelectorPolicy, PolicyError, SelectorContext};

pub const HTTP_METHOD_ORDER: i32 = -1000;
pub const CONSUMES_ORDER: i32 = -900;
pub const CONSTRAINT_FALLBACK_ORDER: i32 = i32::MAX - 100;

/// Filters candidates by `HttpMethodMetadata`.
#[derive(Debug, Default)]
pub struct HttpMethodPolicy;

impl EndpointSelectorPolicy for HttpMethodPolicy {
    fn name(&self) -> &'static str {
        "http-method"
    }

    fn order(&self) -> i32 {
        HTTP_METHOD_ORDER
    }

    fn applies_to(&self, candidates: &CandidateSet) -> bool {
        candidates
            .iter()
            .any(|c| c.endpoint.metadata().http_methods().is_some())
    }

    fn apply<'a>(
        &'a self,
        request: &'a Parts,
        _ctx: &'a SelectorContext,
        candidates: &'a mut CandidateSet,
    ) -> BoxFuture<'a, Result<(), PolicyError>> {
        Box::pin(async move {
            for index in 0..candidates.len() {
                let rejected = candidates
                    .get(index)
                    .and_then(|c| c.endpoint.metadata().http_methods())
                    .map(|m| !m.methods.is_empty() && !m.methods.contains(&request.method))
                    .unwrap_or(false);
                if rejected {
                    tracing::trace!(index, method = %request.method, "Candidate rejected by method");
                    candidates.set_validity(index, false);
                }
            }
            Ok(())
        })
    }
}

/// Filters candidates by `ConsumesMetadata`.
#[derive(Debug, Default)]
pub struct ConsumesPolicy;

impl EndpointSelectorPolicy for ConsumesPolicy {
    fn name(&self) -> &'static str {
        "consumes"
    }

    fn order(&self) -> i32 {
        CONSUMES_ORDER
    }

    fn applies_to(&self, candidates: &CandidateSet) -> bool {
        candidates
            .iter()
            .any(|c| c.endpoint.metadata().consumes().is_some())
    }

    fn apply<'a>(
        &'a self,
        request: &'a Parts,
        _ctx: &'a SelectorContext,
        candidates: &'a mut CandidateSet,
    ) -> BoxFuture<'a, Result<(), PolicyError>> {
        Box::pin(async move {
            let content_type = request
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());

            for index in 0..candidates.len() {
                let rejected = candidates
                    .get(index)
                    .and_then(|c| c.endpoint.metadata().consumes())
                    .map(|m| match content_type {
                        Some(ct) => !content_type_matches(&m.content_types, ct),
                        None => true,
                    })
                    .unwrap_or(false);
                if rejected {
                    tracing::trace!(index, content_type = ?content_type, "Candidate rejected by content type");
                    candidates.set_validity(index, false);
                }
            }
            Ok(())
        })
    }
}

/// Evaluates raw constraint metadata directly against the request.
#[derive(Debug, Default)]
pub struct ConstraintFallbackPolicy;

impl EndpointSelectorPolicy for ConstraintFallbackPolicy {
    fn name(&self) -> &'static str {
        "constraint-fallback"
    }

    fn order(&self) -> i32 {
        CONSTRAINT_FALLBACK_ORDER
    }

    fn applies_to(&self, candidates: &CandidateSet) -> bool {
        candidates
            .iter()
            .any(|c| c.endpoint.metadata().constraints().next().is_some())
    }

    fn apply<'a>(
        &'a self,
        request: &'a Parts,
        _ctx: &'a SelectorContext,
        candidates: &'a mut CandidateSet,
    ) -> BoxFuture<'a, Result<(), PolicyError>> {
        Box::pin(async move {
            for index in 0..candidates.len() {
                if !candidates.is_valid(index) {
                    continue;
                }
                let Some(candidate) = candidates.get(index) else {
                    continue;
                };

                let mut constraints: Vec<&ActionConstraint> = candidate.endpoint.metadata().constraints().collect();
                constraints.sort_by_key(|c| c.order());

                let ctx = ConstraintContext {
                    request,
                    route_values: &candidate.values,
                };
                let accepted = constraints.iter().all(|c| c.accept(&ctx));

                if !accepted {
                    tracing::trace!(index, endpoint = %candidate.endpoint, "Candidate rejected by constraint");
                    candidates.set_validity(index, false);
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::constraints::{CustomConstraint, HttpMethodConstraint};
    use crate::routing::candidate::{CandidateState, RouteValues};
    use crate::routing::endpoint::EndpointBuilder;
    use crate::routing::metadata::{ConsumesMetadata, HttpMethodMetadata, MetadataItem};
    use axum::http::{Method, Request};
    use std::sync::Arc;

    #[derive(Debug)]
    struct IdIsNumeric;

    impl CustomConstraint for IdIsNumeric {
        fn accept(&self, ctx: &ConstraintContext<'_>) -> bool {
            ctx.route_values
                .get("id")
                .map(|id| id.chars().all(|c| c.is_ascii_digit()))
                .unwrap_or(false)
        }
    }

    fn candidate(items: Vec<MetadataItem>, values: RouteValues) -> CandidateState {
        let mut builder = EndpointBuilder::deferred("/x", 0);
        for item in items {
            builder.push(item);
        }
        CandidateState {
            endpoint: Arc::new(builder.build()),
            values,
            score: 0,
        }
    }

    fn parts(method: Method, content_type: Option<&str>) -> Parts {
        let mut builder = Request::builder().method(method).uri("/x");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_method_policy() {
        let mut set = CandidateSet::new(vec![
            candidate(vec![MetadataItem::HttpMethods(HttpMethodMetadata::new([Method::GET]))], RouteValues::new()),
            candidate(vec![MetadataItem::HttpMethods(HttpMethodMetadata::new([Method::POST]))], RouteValues::new()),
            candidate(vec![], RouteValues::new()),
        ]);
        let policy = HttpMethodPolicy;
        assert!(policy.applies_to(&set));

        policy
            .apply(&parts(Method::POST, None), &SelectorContext::new(), &mut set)
            .await
            .unwrap();
        assert!(!set.is_valid(0));
        assert!(set.is_valid(1));
        assert!(set.is_valid(2));
    }

    #[tokio::test]
    async fn test_consumes_policy() {
        let mut set = CandidateSet::new(vec![candidate(
            vec![MetadataItem::Consumes(ConsumesMetadata::new(["application/json".to_string()]))],
            RouteValues::new(),
        )]);

        ConsumesPolicy
            .apply(&parts(Method::POST, Some("application/json")), &SelectorContext::new(), &mut set)
            .await
            .unwrap();
        assert!(set.is_valid(0));

        ConsumesPolicy
            .apply(&parts(Method::POST, None), &SelectorContext::new(), &mut set)
            .await
            .unwrap();
        assert!(!set.is_valid(0));
    }

    #[tokio::test]
    async fn test_raw_constraints_evaluated() {
        let numeric = ActionConstraint::Custom(Arc::new(IdIsNumeric));
        let post_only = ActionConstraint::HttpMethod(HttpMethodConstraint::new([Method::POST]));

        let good: RouteValues = [("id", "12")].into_iter().collect();
        let bad: RouteValues = [("id", "abc")].into_iter().collect();
        let mut set = CandidateSet::new(vec![
            candidate(vec![MetadataItem::Constraint(numeric.clone())], good.clone()),
            candidate(vec![MetadataItem::Constraint(numeric)], bad),
            candidate(vec![MetadataItem::Constraint(post_only)], good),
        ]);

        let policy = ConstraintFallbackPolicy;
        assert!(policy.applies_to(&set));
        policy
            .apply(&parts(Method::GET, None), &SelectorContext::new(), &mut set)
            .await
            .unwrap();

        assert!(set.is_valid(0));
        assert!(!set.is_valid(1));
        assert!(!set.is_valid(2));
    }

    #[test]
    fn test_not_applicable_without_metadata() {
        let set = CandidateSet::new(vec![candidate(vec![], RouteValues::new())]);
        assert!(!HttpMethodPolicy.applies_to(&set));
        assert!(!ConsumesPolicy.applies_to(&set));
        assert!(!ConstraintFallbackPolicy.applies_to(&set));
    }
}
