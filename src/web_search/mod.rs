//! Extraction Protocol
//!
//! Turns "N results for keyword K from provider P" into a bounded sequence of
//! provider page fetches, each run on an instance borrowed from the pool.

mod error;
pub mod pagination;
mod types;

pub use error::SearchError;
pub use pagination::PaginationPlan;
pub use types::{ApiResponse, SearchQuery, SearchResult};

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::browser_pool::InstancePool;
use crate::providers::ProviderRegistry;
use crate::renderer::RendererFactory;
use crate::utils::constants::{INTER_REQUEST_DELAY, MAX_KEYWORD_LENGTH, MAX_PAGE, MAX_RESULT_COUNT};

/// Check a request before any pool or provider work. Returns the trimmed keyword.
pub fn validate_request(keyword: &str, page: usize, count: usize) -> Result<&str, SearchError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(SearchError::InvalidRequest(
            "keyword cannot be empty or whitespace-only".to_string(),
        ));
    }
    let length = keyword.chars().count();
    if length > MAX_KEYWORD_LENGTH {
        return Err(SearchError::InvalidRequest(format!(
            "keyword is too long ({length} characters, maximum {MAX_KEYWORD_LENGTH})"
        )));
    }
    if page == 0 {
        return Err(SearchError::InvalidRequest(
            "page must be at least 1".to_string(),
        ));
    }
    if page > MAX_PAGE {
        return Err(SearchError::InvalidRequest(format!(
            "page must be at most {MAX_PAGE}"
        )));
    }
    if count == 0 {
        return Err(SearchError::InvalidRequest(
            "count must be at least 1".to_string(),
        ));
    }
    if count > MAX_RESULT_COUNT {
        return Err(SearchError::InvalidRequest(format!(
            "count must be at most {MAX_RESULT_COUNT}"
        )));
    }
    Ok(keyword)
}

/// Runs searches against providers from a registry using pooled instances
pub struct SearchExtractor<F: RendererFactory> {
    pool: InstancePool<F>,
    registry: Arc<ProviderRegistry>,
    request_delay: Duration,
}

impl<F: RendererFactory> Clone for SearchExtractor<F> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            registry: Arc::clone(&self.registry),
            request_delay: self.request_delay,
        }
    }
}

impl<F: RendererFactory> SearchExtractor<F> {
    pub fn new(pool: InstancePool<F>, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            pool,
            registry,
            request_delay: INTER_REQUEST_DELAY,
        }
    }

    /// Pause between consecutive requests of one search (300 ms by default)
    #[must_use]
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Fetch up to `count` results for `keyword`, starting at result page `page`.
    ///
    /// Stops early, without error, at the first request that yields nothing.
    /// An instance is borrowed per request and always returned before the
    /// outcome is inspected.
    pub async fn search(
        &self,
        provider: &str,
        keyword: &str,
        page: usize,
        count: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let keyword = validate_request(keyword, page, count)?;
        let provider = self.registry.get(provider).await?;
        let plan = PaginationPlan::new(
            provider.pagination_type(),
            provider.max_results_per_page(),
            page,
            count,
        );

        info!(
            provider = provider.name(),
            keyword,
            page,
            count,
            per_page = plan.per_page(),
            requests = plan.requests(),
            "Starting search"
        );

        let mut results = Vec::new();
        for (index, value) in plan.values().enumerate() {
            let offset = plan.offset(index);
            let url = provider.search_url(keyword, value, plan.per_page());
            info!(provider = provider.name(), %url, "Fetching search page");
            let request = provider.fetch_request(url, plan.per_page());

            let instance = self.pool.acquire().await?;
            let outcome = instance.fetch(&request).await;
            instance.release().await;

            let records = match outcome {
                Ok(Some(records)) if !records.is_empty() => records,
                Ok(_) => {
                    info!(
                        provider = provider.name(),
                        keyword, offset, "No search results, provider exhausted"
                    );
                    break;
                }
                Err(source) => {
                    return Err(SearchError::Fetch {
                        provider: provider.name().to_string(),
                        url: request.url,
                        source,
                    });
                }
            };

            let found = records.len();
            info!(
                provider = provider.name(),
                keyword,
                offset,
                found,
                "Extracted search results"
            );
            let before = results.len();
            results.extend(records.into_iter().filter_map(SearchResult::from_record));
            let skipped = found - (results.len() - before);
            if skipped > 0 {
                debug!(offset, skipped, "Skipped records without a url");
            }

            if index + 1 < plan.requests() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        results.truncate(count);
        info!(provider = provider.name(), keyword, total = results.len(), "Search finished");
        Ok(results)
    }
}
