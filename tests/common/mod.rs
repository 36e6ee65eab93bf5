//! Shared fixtures for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{header, Request, Response};
use futures_util::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use page_materializer::config::PolicyConfig;
use page_materializer::pages::descriptor::CompiledPageDescriptor;
use page_materializer::pages::invoker::{InvokeError, InvokerFactory, PageContext, PageInvoker};
use page_materializer::pages::loader::{LoadError, PageLoader};
use page_materializer::pages::reference::PageReference;
use page_materializer::routing::candidate::{CandidateSet, CandidateState, RouteValues};
use page_materializer::routing::endpoint::{EndpointBuilder, HandlerFuture, RouteEndpoint};
use page_materializer::PageMaterializationPolicy;

/// In-memory loader that counts calls and can be told to fail.
#[derive(Default)]
pub struct FakeLoader {
    pages: Mutex<HashMap<PageReference, Arc<CompiledPageDescriptor>>>,
    failing: Mutex<HashSet<PageReference>>,
    loads: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader that sleeps before answering, to widen race windows.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Register (or replace) the descriptor returned for its page.
    pub fn publish(&self, descriptor: CompiledPageDescriptor) -> Arc<CompiledPageDescriptor> {
        let descriptor = Arc::new(descriptor);
        self.pages
            .lock()
            .unwrap()
            .insert(descriptor.page.clone(), Arc::clone(&descriptor));
        descriptor
    }

    pub fn fail(&self, page: &PageReference) {
        self.failing.lock().unwrap().insert(page.clone());
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl PageLoader for FakeLoader {
    fn load<'a>(
        &'a self,
        page: &'a PageReference,
    ) -> BoxFuture<'a, Result<Arc<CompiledPageDescriptor>, LoadError>> {
        Box::pin(async move {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.lock().unwrap().contains(page) {
                return Err(LoadError::Compilation {
                    page: page.to_string(),
                    message: "syntax error".to_string(),
                });
            }
            self.pages
                .lock()
                .unwrap()
                .get(page)
                .cloned()
                .ok_or_else(|| LoadError::NotFound(page.to_string()))
        })
    }
}

/// Responds with the page reference and the route values it received.
#[derive(Debug, Default)]
pub struct EchoInvokers;

struct EchoInvoker {
    context: PageContext,
}

impl PageInvoker for EchoInvoker {
    fn invoke(self: Box<Self>) -> HandlerFuture {
        let values: Vec<String> = self
            .context
            .route_values
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        let body = format!("{} [{}]", self.context.descriptor.page, values.join(","));
        Box::pin(async move {
            Ok(Response::builder()
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from(body))
                .unwrap())
        })
    }
}

impl InvokerFactory for EchoInvokers {
    fn create_invoker(&self, context: PageContext) -> Result<Box<dyn PageInvoker>, InvokeError> {
        Ok(Box::new(EchoInvoker { context }))
    }
}

pub fn policy(loader: Arc<FakeLoader>, memoize: bool) -> PageMaterializationPolicy {
    PageMaterializationPolicy::builder()
        .loader(loader)
        .invoker_factory(Arc::new(EchoInvokers))
        .config(PolicyConfig {
            memoize_endpoints: memoize,
            memo_capacity: 64,
        })
        .build()
        .unwrap()
}

pub fn page_template(path: &str, pattern: &str, order: i32) -> Arc<RouteEndpoint> {
    Arc::new(EndpointBuilder::page_template(PageReference::new(path), pattern, order).build())
}

pub fn plain_endpoint(pattern: &str, order: i32) -> Arc<RouteEndpoint> {
    Arc::new(EndpointBuilder::deferred(pattern, order).build())
}

pub fn candidate(endpoint: &Arc<RouteEndpoint>, values: &[(&str, &str)], score: i32) -> CandidateState {
    CandidateState {
        endpoint: Arc::clone(endpoint),
        values: values.iter().copied().collect::<RouteValues>(),
        score,
    }
}

pub fn candidates(states: Vec<CandidateState>) -> CandidateSet {
    CandidateSet::new(states)
}

pub fn parts(method: &str, uri: &str) -> Parts {
    let (parts, _) = Request::builder()
        .method(method)
        .uri(uri)
        .body(())
        .unwrap()
        .into_parts();
    parts
}
