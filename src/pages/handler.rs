//! Per-request page handler.
//!
//! # Design Decisions
//! - Plain value object holding the compiled descriptor and the invoker
//!   factory; no closure is allocated per request
//! - Performs no compilation; the descriptor is already resolved

use axum::body::Body;
use axum::http::Request;
use std::fmt;
use std::sync::Arc;

use crate::pages::descriptor::CompiledPageDescriptor;
use crate::pages::invoker::{InvokerFactory, PageContext};
use crate::routing::candidate::RouteValues;
use crate::routing::endpoint::{HandlerFuture, RequestHandler};

/// Handler bound to one compiled page.
#[derive(Clone)]
pub struct PageRequestHandler {
    descriptor: Arc<CompiledPageDescriptor>,
    invokers: Arc<dyn InvokerFactory>,
}

impl PageRequestHandler {
    pub fn new(descriptor: Arc<CompiledPageDescriptor>, invokers: Arc<dyn InvokerFactory>) -> Self {
        Self { descriptor, invokers }
    }

    pub fn descriptor(&self) -> &Arc<CompiledPageDescriptor> {
        &self.descriptor
    }
}

/// Run a page: build the context, create an invoker, invoke it.
///
/// Route values are read from the request extensions, where the pipeline
/// puts them after selecting a candidate.
pub fn run_page(
    invokers: &dyn InvokerFactory,
    descriptor: &Arc<CompiledPageDescriptor>,
    request: Request<Body>,
) -> HandlerFuture {
    let route_values = request
        .extensions()
        .get::<RouteValues>()
        .cloned()
        .unwrap_or_default();

    let context = PageContext {
        request,
        route_values,
        descriptor: Arc::clone(descriptor),
    };

    match invokers.create_invoker(context) {
        Ok(invoker) => invoker.invoke(),
        Err(e) => Box::pin(async move { Err(e) }),
    }
}

impl RequestHandler for PageRequestHandler {
    fn handle(&self, request: Request<Body>) -> HandlerFuture {
        run_page(self.invokers.as_ref(), &self.descriptor, request)
    }
}

impl fmt::Debug for PageRequestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRequestHandler")
            .field("page", &self.descriptor.page)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::invoker::{InvokeError, PageInvoker};
    use crate::pages::reference::PageReference;
    use axum::http::Response;

    struct EchoValues;

    struct EchoInvoker(PageContext);

    impl PageInvoker for EchoInvoker {
        fn invoke(self: Box<Self>) -> HandlerFuture {
            let body = self
                .0
                .route_values
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(",");
            Box::pin(async move { Ok(Response::new(Body::from(body))) })
        }
    }

    impl InvokerFactory for EchoValues {
        fn create_invoker(&self, context: PageContext) -> Result<Box<dyn PageInvoker>, InvokeError> {
            Ok(Box::new(EchoInvoker(context)))
        }
    }

    struct Failing;

    impl InvokerFactory for Failing {
        fn create_invoker(&self, context: PageContext) -> Result<Box<dyn PageInvoker>, InvokeError> {
            Err(InvokeError::Factory {
                page: context.descriptor.page.to_string(),
                message: "no model".into(),
            })
        }
    }

    fn descriptor() -> Arc<CompiledPageDescriptor> {
        Arc::new(CompiledPageDescriptor::new(PageReference::new("/Orders.page")))
    }

    #[tokio::test]
    async fn test_route_values_from_extensions() {
        let handler = PageRequestHandler::new(descriptor(), Arc::new(EchoValues));

        let mut request = Request::new(Body::empty());
        let values: RouteValues = [("id", "7")].into_iter().collect();
        request.extensions_mut().insert(values);

        let response = handler.handle(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"id=7");
    }

    #[tokio::test]
    async fn test_factory_error_propagates() {
        let handler = PageRequestHandler::new(descriptor(), Arc::new(Failing));
        let result = handler.handle(Request::new(Body::empty())).await;
        assert!(matches!(result, Err(InvokeError::Factory { .. })));
    }
}
