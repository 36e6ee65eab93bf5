//! HTTP server for the page host.
//!
//! # Responsibilities
//! - Create the Axum router with the page fallback handler
//! - Wire up middleware (timeout, tracing)
//! - Dispatch requests: match templates, run selector policies, invoke
//! - Apply configuration reloads
//!
//! # Design Decisions
//! - Only `pages` is hot-reloadable. Listener, timeout, policy and
//!   observability settings are fixed at startup; a reload that changes
//!   them is logged as needing a restart

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::{
    HostConfig, ListenerConfig, ObservabilityConfig, PolicyConfig, TimeoutConfig,
};
use crate::host::matcher::TemplateMatcher;
use crate::host::static_pages::{StaticInvokerFactory, StaticPageCompiler};
use crate::pages::loader::CachingPageLoader;
use crate::policy::fallback::{ConstraintFallbackPolicy, ConsumesPolicy, HttpMethodPolicy};
use crate::policy::materialize::PageMaterializationPolicy;
use crate::routing::policy::{EndpointSelectorPolicy, PolicyError, SelectorContext};
use crate::routing::selector::EndpointPipeline;

/// Serves configured pages.
pub struct PageHost {
    matcher: ArcSwap<TemplateMatcher>,
    loader: Arc<CachingPageLoader<StaticPageCompiler>>,
    policy: Arc<PageMaterializationPolicy>,
    pipeline: EndpointPipeline,
    fixed: FixedSettings,
}

/// Settings applied once at startup.
struct FixedSettings {
    listener: ListenerConfig,
    timeouts: TimeoutConfig,
    policy: PolicyConfig,
    observability: ObservabilityConfig,
}

impl FixedSettings {
    fn from_config(config: &HostConfig) -> Self {
        Self {
            listener: config.listener.clone(),
            timeouts: config.timeouts.clone(),
            policy: config.policy.clone(),
            observability: config.observability.clone(),
        }
    }

    fn changed_sections(&self, config: &HostConfig) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.listener != config.listener {
            changed.push("listener");
        }
        if self.timeouts != config.timeouts {
            changed.push("timeouts");
        }
        if self.policy != config.policy {
            changed.push("policy");
        }
        if self.observability != config.observability {
            changed.push("observability");
        }
        changed
    }
}

impl PageHost {
    /// Create a host with the given configuration.
    pub fn new(config: &HostConfig) -> Result<Self, PolicyError> {
        let loader = Arc::new(CachingPageLoader::new(StaticPageCompiler::new(&config.pages)));

        let policy = Arc::new(
            PageMaterializationPolicy::builder()
                .loader(loader.clone())
                .invoker_factory(Arc::new(StaticInvokerFactory))
                .config(config.policy.clone())
                .build()?,
        );

        let policies: Vec<Arc<dyn EndpointSelectorPolicy>> = vec![
            policy.clone(),
            Arc::new(HttpMethodPolicy),
            Arc::new(ConsumesPolicy),
            Arc::new(ConstraintFallbackPolicy),
        ];
        let pipeline = EndpointPipeline::new(policies);

        tracing::info!(
            pages = config.pages.len(),
            policies = ?pipeline.policy_names(),
            "Page host initialized"
        );

        Ok(Self {
            matcher: ArcSwap::from_pointee(TemplateMatcher::from_pages(&config.pages)),
            loader,
            policy,
            pipeline,
            fixed: FixedSettings::from_config(config),
        })
    }

    /// Apply a new page configuration.
    ///
    /// Compiled pages and memoized endpoints are dropped; the next request
    /// for each page compiles it again.
    pub fn reload(&self, config: &HostConfig) {
        let ignored = self.restart_required(config);
        if !ignored.is_empty() {
            tracing::warn!(
                sections = ?ignored,
                "Configuration sections changed but only apply on restart"
            );
        }

        self.loader.compiler().replace(&config.pages);
        self.matcher
            .store(Arc::new(TemplateMatcher::from_pages(&config.pages)));
        self.loader.invalidate_all();
        self.policy.clear_memo();
        tracing::info!(pages = config.pages.len(), "Page configuration reloaded");
    }

    /// Sections of `config` that differ from the running settings and that
    /// a reload cannot apply.
    pub fn restart_required(&self, config: &HostConfig) -> Vec<&'static str> {
        self.fixed.changed_sections(config)
    }

    /// Number of pages currently held compiled in the loader cache.
    pub fn compiled_pages(&self) -> usize {
        self.loader.len()
    }

    pub fn memoized_endpoints(&self) -> usize {
        self.policy.memo_len()
    }

    /// Match, select and run one request.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let candidates = self.matcher.load().match_path(request.uri().path());
        self.pipeline
            .dispatch(request, candidates, SelectorContext::new())
            .await
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(self: Arc<Self>) -> Router {
        let timeout = Duration::from_secs(self.fixed.timeouts.request_secs);
        Router::new()
            .fallback(page_handler)
            .with_state(self)
            .layer(TimeoutLayer::new(timeout))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` resolves, applying config updates as they arrive.
    pub async fn run<F>(
        self: Arc<Self>,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<HostConfig>,
        shutdown: F,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reloader = {
            let host = self.clone();
            tokio::spawn(async move {
                while let Some(config) = config_updates.recv().await {
                    host.reload(&config);
                }
            })
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn page_handler(State(host): State<Arc<PageHost>>, request: Request<Body>) -> Response {
    host.handle(request).await
}
