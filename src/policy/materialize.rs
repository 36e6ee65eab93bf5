//! Page materialization policy.
//!
//! # Responsibilities
//! - Detect candidates whose endpoint is a deferred page
//! - Load the compiled page through the page loader
//! - Build the materialized endpoint and swap it into the candidate set
//!
//! # Design Decisions
//! - No request-scoped state on the policy; one instance serves all requests
//! - Loader errors propagate unchanged; no retry
//! - Materialized endpoints are memoized per template and descriptor
//!   instance (configurable), so steady-state requests allocate nothing new

use axum::http::request::Parts;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;

use crate::config::PolicyConfig;
use crate::observability::metrics;
use crate::pages::descriptor::CompiledPageDescriptor;
use crate::pages::handler::PageRequestHandler;
use crate::pages::invoker::InvokerFactory;
use crate::pages::loader::PageLoader;
use crate::policy::assemble::build_page_endpoint;
use crate::policy::memo::EndpointMemo;
use crate::routing::candidate::CandidateSet;
use crate::routing::endpoint::RouteEndpoint;
use crate::routing::policy::{EndpointSelectorPolicy, PolicyError, SelectorContext};

/// Runs before every other policy so they see materialized metadata.
pub const PAGE_MATERIALIZATION_ORDER: i32 = i32::MIN + 100;

/// Replaces deferred page candidates with executable endpoints.
pub struct PageMaterializationPolicy {
    loader: Arc<dyn PageLoader>,
    invokers: Arc<dyn InvokerFactory>,
    memo: Option<EndpointMemo>,
}

/// Builder for [`PageMaterializationPolicy`].
pub struct PageMaterializationPolicyBuilder {
    loader: Option<Arc<dyn PageLoader>>,
    invokers: Option<Arc<dyn InvokerFactory>>,
    config: PolicyConfig,
}

impl PageMaterializationPolicyBuilder {
    pub fn loader(mut self, loader: Arc<dyn PageLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn invoker_factory(mut self, invokers: Arc<dyn InvokerFactory>) -> Self {
        self.invokers = Some(invokers);
        self
    }

    pub fn config(mut self, config: PolicyConfig) -> Self {
        self.config = config;
        self
    }

    /// Fails if a collaborator is missing.
    pub fn build(self) -> Result<PageMaterializationPolicy, PolicyError> {
        let loader = self.loader.ok_or(PolicyError::InvalidArgument("loader"))?;
        let invokers = self.invokers.ok_or(PolicyError::InvalidArgument("invoker_factory"))?;

        let memo = if self.config.memoize_endpoints {
            if self.config.memo_capacity == 0 {
                return Err(PolicyError::InvalidArgument("memo_capacity"));
            }
            Some(EndpointMemo::new(self.config.memo_capacity))
        } else {
            None
        };

        Ok(PageMaterializationPolicy { loader, invokers, memo })
    }
}

impl PageMaterializationPolicy {
    pub fn builder() -> PageMaterializationPolicyBuilder {
        PageMaterializationPolicyBuilder {
            loader: None,
            invokers: None,
            config: PolicyConfig::default(),
        }
    }

    /// True if any candidate is a deferred page.
    pub fn applies_to_candidates(candidates: &CandidateSet) -> bool {
        candidates.iter().any(|c| c.endpoint.is_deferred_page())
    }

    /// Materialize every deferred page candidate in place.
    ///
    /// Route values of replaced candidates are kept as they were. On a load
    /// failure the failing candidate is left untouched and the error is
    /// returned.
    #[tracing::instrument(name = "materialize_pages", skip_all, fields(request_id = %ctx.request_id()))]
    pub async fn materialize(
        &self,
        _request: &Parts,
        ctx: &SelectorContext,
        candidates: &mut CandidateSet,
    ) -> Result<(), PolicyError> {
        for index in 0..candidates.len() {
            let Some(candidate) = candidates.get(index) else {
                continue;
            };
            let template = Arc::clone(&candidate.endpoint);
            let Some(page) = template.metadata().page_reference() else {
                continue;
            };

            let start = Instant::now();
            let descriptor = match self.loader.load(page).await {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    tracing::error!(page = %page, error = %e, "Failed to load page");
                    metrics::record_load_failure();
                    return Err(e.into());
                }
            };
            metrics::record_load_duration(start);

            let endpoint = self.endpoint_for(&template, descriptor);
            let values = candidates
                .get(index)
                .map(|c| c.values.clone())
                .unwrap_or_default();
            candidates.replace_endpoint(index, endpoint, values);
        }

        Ok(())
    }

    fn endpoint_for(
        &self,
        template: &Arc<RouteEndpoint>,
        descriptor: Arc<CompiledPageDescriptor>,
    ) -> Arc<RouteEndpoint> {
        if let Some(endpoint) = self.memo.as_ref().and_then(|m| m.get(template, &descriptor)) {
            metrics::record_materialization("memoized");
            return endpoint;
        }

        let handler = Arc::new(PageRequestHandler::new(
            Arc::clone(&descriptor),
            Arc::clone(&self.invokers),
        ));
        let endpoint = Arc::new(build_page_endpoint(template, &descriptor, handler));
        metrics::record_materialization("built");
        tracing::debug!(
            page = %descriptor.page,
            endpoint = %endpoint,
            metadata_items = endpoint.metadata().len(),
            "Materialized page endpoint"
        );

        if let Some(memo) = &self.memo {
            if !memo.insert(template, &descriptor, &endpoint) {
                tracing::debug!(page = %descriptor.page, "Endpoint memo full, not caching");
            }
        }

        endpoint
    }

    /// Forget memoized endpoints (e.g., after a route table swap).
    pub fn clear_memo(&self) {
        if let Some(memo) = &self.memo {
            memo.clear();
        }
    }

    /// Number of memoized endpoints.
    pub fn memo_len(&self) -> usize {
        self.memo.as_ref().map(EndpointMemo::len).unwrap_or(0)
    }
}

impl EndpointSelectorPolicy for PageMaterializationPolicy {
    fn name(&self) -> &'static str {
        "page-materialization"
    }

    fn order(&self) -> i32 {
        PAGE_MATERIALIZATION_ORDER
    }

    fn applies_to(&self, candidates: &CandidateSet) -> bool {
        Self::applies_to_candidates(candidates)
    }

    fn apply<'a>(
        &'a self,
        request: &'a Parts,
        ctx: &'a SelectorContext,
        candidates: &'a mut CandidateSet,
    ) -> BoxFuture<'a, Result<(), PolicyError>> {
        Box::pin(self.materialize(request, ctx, candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::invoker::{InvokeError, PageContext, PageInvoker};
    use crate::pages::loader::LoadError;
    use crate::pages::reference::PageReference;

    struct NoPages;

    impl PageLoader for NoPages {
        fn load<'a>(
            &'a self,
            page: &'a PageReference,
        ) -> BoxFuture<'a, Result<Arc<CompiledPageDescriptor>, LoadError>> {
            Box::pin(async move { Err(LoadError::NotFound(page.to_string())) })
        }
    }

    struct NoInvokers;

    impl InvokerFactory for NoInvokers {
        fn create_invoker(&self, context: PageContext) -> Result<Box<dyn PageInvoker>, InvokeError> {
            Err(InvokeError::Factory {
                page: context.descriptor.page.to_string(),
                message: "unsupported".into(),
            })
        }
    }

    #[test]
    fn test_missing_loader() {
        let result = PageMaterializationPolicy::builder()
            .invoker_factory(Arc::new(NoInvokers))
            .build();
        assert!(matches!(result, Err(PolicyError::InvalidArgument("loader"))));
    }

    #[test]
    fn test_missing_invoker_factory() {
        let result = PageMaterializationPolicy::builder().loader(Arc::new(NoPages)).build();
        assert!(matches!(result, Err(PolicyError::InvalidArgument("invoker_factory"))));
    }

    #[test]
    fn test_zero_memo_capacity_rejected() {
        let result = PageMaterializationPolicy::builder()
            .loader(Arc::new(NoPages))
            .invoker_factory(Arc::new(NoInvokers))
            .config(PolicyConfig {
                memoize_endpoints: true,
                memo_capacity: 0,
            })
            .build();
        assert!(matches!(result, Err(PolicyError::InvalidArgument("memo_capacity"))));
    }

    #[test]
    fn test_runs_first() {
        let policy = PageMaterializationPolicy::builder()
            .loader(Arc::new(NoPages))
            .invoker_factory(Arc::new(NoInvokers))
            .build()
            .unwrap();
        assert_eq!(policy.order(), i32::MIN + 100);
        assert_eq!(policy.memo_len(), 0);
    }
}
