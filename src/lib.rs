//! searchpool: structured search results from browser-rendered provider pages
//!
//! A bounded, self-healing [`InstancePool`] of renderer handles is shared by
//! every search. [`SearchExtractor`] plans the provider requests for a query,
//! runs each on a pooled instance and maps the extracted records into
//! [`SearchResult`]s. [`SearchService`] ties the pieces to process settings.

pub mod browser_pool;
pub mod config;
pub mod providers;
pub mod renderer;
pub mod service;
pub mod utils;
pub mod web_search;

pub use browser_pool::{
    InstancePool, PoolConfig, PoolConfigBuilder, PoolError, PoolStatus, PooledInstance,
    ShutdownPolicy,
};
pub use config::Settings;
pub use providers::{
    ConfigError, FieldType, PaginationType, Provider, ProviderConfig, ProviderFile, ProviderRegistry,
    RegionTable, SearchField, SearchSchema,
};
pub use renderer::{
    ChromiumRenderer, ChromiumRendererConfig, FetchRequest, Record, RenderHandle, RendererError,
    RendererFactory, WaitCondition,
};
pub use service::SearchService;
pub use web_search::{
    ApiResponse, PaginationPlan, SearchError, SearchExtractor, SearchQuery, SearchResult,
};
