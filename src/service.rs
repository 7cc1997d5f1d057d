//! Search service
//!
//! Owns the instance pool, the provider registry and the process settings.
//! This is the surface an HTTP layer calls: `initialize()` at startup,
//! `search()` per request, `close()` at shutdown.

use std::sync::Arc;
use tracing::info;

use crate::browser_pool::{InstancePool, PoolError, PoolStatus};
use crate::config::Settings;
use crate::providers::ProviderRegistry;
use crate::renderer::RendererFactory;
use crate::web_search::{ApiResponse, SearchError, SearchExtractor, SearchQuery, SearchResult};

pub struct SearchService<F: RendererFactory> {
    settings: Settings,
    pool: InstancePool<F>,
    extractor: SearchExtractor<F>,
}

impl<F: RendererFactory> SearchService<F> {
    /// Build the pool from `settings` and the registry from `settings.schema_dir`
    pub fn new(settings: Settings, factory: F) -> Result<Self, PoolError> {
        let pool = InstancePool::new(factory, settings.pool_config()?)?;
        let registry = Arc::new(ProviderRegistry::new(settings.schema_dir.clone(), &settings));
        Ok(Self::from_parts(settings, pool, registry))
    }

    /// Assemble a service from an existing pool and registry
    pub fn from_parts(
        settings: Settings,
        pool: InstancePool<F>,
        registry: Arc<ProviderRegistry>,
    ) -> Self {
        let extractor = SearchExtractor::new(pool.clone(), registry);
        Self {
            settings,
            pool,
            extractor,
        }
    }

    /// Replace the extractor, e.g. to change the inter-request delay
    #[must_use]
    pub fn with_extractor(mut self, configure: impl FnOnce(SearchExtractor<F>) -> SearchExtractor<F>) -> Self {
        self.extractor = configure(self.extractor);
        self
    }

    pub async fn initialize(&self) -> Result<(), PoolError> {
        self.pool.initialize().await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        self.extractor
            .search(&query.provider, &query.keyword, query.page, query.count)
            .await
    }

    /// `search` wrapped in the response envelope
    pub async fn search_response(&self, query: &SearchQuery) -> ApiResponse<Vec<SearchResult>> {
        ApiResponse::from_search(self.search(query).await)
    }

    pub async fn close(&self) {
        info!("Shutting down search service");
        self.pool.close().await;
    }

    #[must_use]
    pub fn pool(&self) -> &InstancePool<F> {
        &self.pool
    }

    #[must_use]
    pub fn status(&self) -> PoolStatus {
        self.pool.status()
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        self.extractor.registry()
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
