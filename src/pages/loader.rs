//! Page loading and compile caching.
//!
//! # Responsibilities
//! - Resolve a page reference into a compiled descriptor
//! - Cache compiled descriptors per page reference
//! - Run at most one compile per page at a time; concurrent callers share it
//!
//! # Design Decisions
//! - The cache is the only state shared across requests, so it is the only
//!   place with internal synchronization (`DashMap` + per-page `OnceCell`)
//! - Failed compiles are not cached; the next request compiles again
//! - Reload is explicit: `invalidate` drops an entry, and the next load
//!   produces a new descriptor instance

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::observability::metrics;
use crate::pages::descriptor::CompiledPageDescriptor;
use crate::pages::reference::PageReference;

/// Errors raised while loading a page.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// No page exists for the reference.
    #[error("page not found: {0}")]
    NotFound(String),

    /// The page exists but failed to compile.
    #[error("failed to compile page {page}: {message}")]
    Compilation { page: String, message: String },
}

/// Resolves page references into compiled descriptors.
///
/// Must be safe to call concurrently. Returns the same descriptor for the
/// same reference until the page is reloaded.
pub trait PageLoader: Send + Sync {
    fn load<'a>(&'a self, page: &'a PageReference) -> BoxFuture<'a, Result<Arc<CompiledPageDescriptor>, LoadError>>;
}

/// Compiles a page from scratch. No caching.
pub trait PageCompiler: Send + Sync {
    fn compile<'a>(&'a self, page: &'a PageReference) -> BoxFuture<'a, Result<CompiledPageDescriptor, LoadError>>;
}

type Slot = Arc<OnceCell<Arc<CompiledPageDescriptor>>>;

/// Loader that caches compiled descriptors per page.
pub struct CachingPageLoader<C> {
    compiler: C,
    entries: DashMap<PageReference, Slot>,
}

impl<C: PageCompiler> CachingPageLoader<C> {
    pub fn new(compiler: C) -> Self {
        Self {
            compiler,
            entries: DashMap::new(),
        }
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Drop the cached descriptor for one page.
    pub fn invalidate(&self, page: &PageReference) {
        if self.entries.remove(page).is_some() {
            tracing::info!(page = %page, "Page cache entry invalidated");
        }
    }

    /// Drop every cached descriptor.
    pub fn invalidate_all(&self) {
        let count = self.entries.len();
        self.entries.clear();
        tracing::info!(count, "Page cache cleared");
    }

    /// Number of pages with a cache slot (compiled or compiling).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn load_cached(&self, page: &PageReference) -> Result<Arc<CompiledPageDescriptor>, LoadError> {
        // Clone the slot out so no map guard is held across the await
        let slot: Slot = {
            let entry = self.entries.entry(page.clone()).or_default();
            Arc::clone(entry.value())
        };

        if let Some(descriptor) = slot.get() {
            return Ok(Arc::clone(descriptor));
        }

        let descriptor = slot
            .get_or_try_init(|| async {
                let start = Instant::now();
                tracing::debug!(page = %page, "Compiling page");
                let result = self.compiler.compile(page).await;
                metrics::record_compilation(result.is_ok(), start);
                result.map(Arc::new)
            })
            .await?;

        Ok(Arc::clone(descriptor))
    }
}

impl<C: PageCompiler> PageLoader for CachingPageLoader<C> {
    fn load<'a>(&'a self, page: &'a PageReference) -> BoxFuture<'a, Result<Arc<CompiledPageDescriptor>, LoadError>> {
        Box::pin(self.load_cached(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingCompiler {
        compiles: AtomicUsize,
        fail_first: bool,
    }

    impl PageCompiler for CountingCompiler {
        fn compile<'a>(&'a self, page: &'a PageReference) -> BoxFuture<'a, Result<CompiledPageDescriptor, LoadError>> {
            Box::pin(async move {
                let n = self.compiles.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                if self.fail_first && n == 0 {
                    return Err(LoadError::Compilation {
                        page: page.to_string(),
                        message: "syntax error".into(),
                    });
                }
                Ok(CompiledPageDescriptor::new(page.clone()))
            })
        }
    }

    #[tokio::test]
    async fn test_cached_instance_reused() {
        let loader = CachingPageLoader::new(CountingCompiler::default());
        let page = PageReference::new("/Index.page");

        let a = loader.load(&page).await.unwrap();
        let b = loader.load(&page).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(loader.compiler().compiles.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_compile_under_concurrency() {
        let loader = Arc::new(CachingPageLoader::new(CountingCompiler::default()));
        let page = PageReference::new("/Busy.page");

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let loader = loader.clone();
            let page = page.clone();
            tasks.push(tokio::spawn(async move { loader.load(&page).await.unwrap() }));
        }

        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap());
        }

        assert_eq!(loader.compiler().compiles.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_invalidate_yields_new_instance() {
        let loader = CachingPageLoader::new(CountingCompiler::default());
        let page = PageReference::new("/Index.page");

        let before = loader.load(&page).await.unwrap();
        loader.invalidate(&page);
        let after = loader.load(&page).await.unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(loader.compiler().compiles.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_not_cached() {
        let loader = CachingPageLoader::new(CountingCompiler {
            fail_first: true,
            ..Default::default()
        });
        let page = PageReference::new("/Broken.page");

        assert!(matches!(loader.load(&page).await, Err(LoadError::Compilation { .. })));
        assert!(loader.load(&page).await.is_ok());
    }
}
