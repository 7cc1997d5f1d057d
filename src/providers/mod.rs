//! Provider Schema Registry
//!
//! Loads `<schema_dir>/<provider>.json`, validates it, applies process-wide
//! defaults and caches the resolved [`Provider`]. Failures are per provider.

mod error;
pub mod regions;
pub mod template;
mod types;

pub use error::ConfigError;
pub use regions::RegionTable;
pub use template::{Template, TemplateError};
pub use types::{FieldType, PaginationType, ProviderConfig, ProviderFile, SearchField, SearchSchema};

use dashmap::DashMap;
use rand::Rng;
use rand::seq::IndexedRandom;
use scraper::Selector;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::renderer::{FetchRequest, WaitCondition};
use crate::utils::constants::RANDOM_USER_AGENTS;

/// A validated provider with defaults applied
#[derive(Debug)]
pub struct Provider {
    name: String,
    config: ProviderConfig,
    schema: Arc<SearchSchema>,
    base_url: String,
    url_template: Template,
    script: Option<Template>,
    wait_for: WaitCondition,
}

impl Provider {
    /// Validate `file` and resolve it against process settings and the region table
    pub fn resolve(
        name: &str,
        file: ProviderFile,
        settings: &Settings,
        regions: &RegionTable,
    ) -> Result<Self, ConfigError> {
        let ProviderFile { mut config, schema } = file;

        validate_schema(name, &schema)?;
        if config.max_results_per_page == 0 {
            return Err(ConfigError::InvalidSchema {
                provider: name.to_string(),
                message: "max_results_per_page must be greater than 0".to_string(),
            });
        }

        let pagination_param = config.pagination_param().to_string();
        let url_names = ["kw", "number", "timestamp", "rand", pagination_param.as_str()];
        let url_template = Template::parse(&config.url_template, &url_names).map_err(|e| {
            ConfigError::InvalidTemplate {
                provider: name.to_string(),
                message: format!("url_template: {e}"),
            }
        })?;
        if !url_template.placeholders().any(|p| p == "kw") {
            warn!(provider = name, "url_template has no {{kw}} placeholder");
        }

        let script = config
            .js_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .map(|code| Template::parse(code, &["number"]))
            .transpose()
            .map_err(|e| ConfigError::InvalidTemplate {
                provider: name.to_string(),
                message: format!("js_code: {e}"),
            })?;

        if config.name.is_empty() {
            config.name = name.to_string();
        }
        if config.user_agent.is_none() {
            config.user_agent = Some(settings.user_agent.clone());
        }
        if config.user_agent_mode.is_none() {
            config.user_agent_mode.clone_from(&settings.user_agent_mode);
        }
        if config.proxy.is_none() {
            config.proxy.clone_from(&settings.proxy);
        } else if config.proxy != settings.proxy {
            // Chromium binds proxies per process, not per page
            warn!(
                provider = name,
                "Provider proxy {} differs from the browser proxy and is not applied",
                config.proxy.as_deref().unwrap_or_default()
            );
        }

        let base_url = regions
            .base_url(name, &settings.region)
            .ok_or_else(|| ConfigError::MissingBaseUrl {
                provider: name.to_string(),
                region: settings.region.clone(),
            })?
            .to_string();

        let wait_for = WaitCondition::parse(&config.wait_for);

        Ok(Self {
            name: name.to_string(),
            config,
            schema: Arc::new(schema),
            base_url,
            url_template,
            script,
            wait_for,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<SearchSchema> {
        &self.schema
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn pagination_type(&self) -> PaginationType {
        self.config.pagination_type
    }

    #[must_use]
    pub fn max_results_per_page(&self) -> usize {
        self.config.max_results_per_page
    }

    /// Build one request URL.
    ///
    /// `pagination_value` is a page index or an offset depending on the
    /// pagination type. Timestamp and nonce are fresh on every call.
    #[must_use]
    pub fn search_url(&self, keyword: &str, pagination_value: usize, number: usize) -> String {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let nonce: u32 = rand::rng().random_range(10_000..=99_999);

        let values = HashMap::from([
            ("kw", urlencoding::encode(keyword).into_owned()),
            ("number", number.to_string()),
            ("timestamp", timestamp.to_string()),
            ("rand", nonce.to_string()),
            (self.config.pagination_param(), pagination_value.to_string()),
        ]);

        format!("{}{}", self.base_url, self.url_template.render(&values))
    }

    /// Inline script for a request of `number` results
    #[must_use]
    pub fn script(&self, number: usize) -> Option<String> {
        let values = HashMap::from([("number", number.to_string())]);
        self.script.as_ref().map(|t| t.render(&values))
    }

    /// User agent for the next request
    #[must_use]
    pub fn user_agent(&self) -> Option<String> {
        if self.config.user_agent_mode.as_deref() == Some("random") {
            return RANDOM_USER_AGENTS
                .choose(&mut rand::rng())
                .map(|ua| (*ua).to_string());
        }
        self.config.user_agent.clone()
    }

    /// Everything the renderer needs to fetch `url`
    #[must_use]
    pub fn fetch_request(&self, url: String, number: usize) -> FetchRequest {
        FetchRequest {
            url,
            schema: Arc::clone(&self.schema),
            wait_for: self.wait_for.clone(),
            timeout: self.config.page_timeout(),
            script: self.script(number),
            headers: self.config.headers.clone().unwrap_or_default(),
            user_agent: self.user_agent(),
        }
    }
}

fn validate_schema(provider: &str, schema: &SearchSchema) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::InvalidSchema {
        provider: provider.to_string(),
        message,
    };

    if schema.base_selector.trim().is_empty() {
        return Err(invalid("base_selector cannot be empty".to_string()));
    }
    if schema.fields.is_empty() {
        return Err(invalid("fields list cannot be empty".to_string()));
    }

    Selector::parse(&schema.base_selector)
        .map_err(|e| invalid(format!("base_selector '{}': {e}", schema.base_selector)))?;

    for field in &schema.fields {
        if field.name.trim().is_empty() {
            return Err(invalid("field name cannot be empty".to_string()));
        }
        Selector::parse(&field.selector)
            .map_err(|e| invalid(format!("field '{}' selector '{}': {e}", field.name, field.selector)))?;
        if field.field_type == FieldType::Attribute
            && field.attribute.as_deref().is_none_or(str::is_empty)
        {
            return Err(invalid(format!(
                "field '{}' has type attribute but no attribute name",
                field.name
            )));
        }
    }

    for selector in &schema.error_selectors {
        Selector::parse(selector)
            .map_err(|e| invalid(format!("error selector '{selector}': {e}")))?;
    }

    Ok(())
}

fn is_valid_provider_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Loads and caches providers by name
#[derive(Debug)]
pub struct ProviderRegistry {
    schema_dir: PathBuf,
    settings: Settings,
    regions: RegionTable,
    cache: DashMap<String, Arc<Provider>>,
}

impl ProviderRegistry {
    pub fn new(schema_dir: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            settings: settings.clone(),
            regions: RegionTable::builtin(),
            cache: DashMap::new(),
        }
    }

    /// Replace the region table (builtin by default)
    #[must_use]
    pub fn with_regions(mut self, regions: RegionTable) -> Self {
        self.regions = regions;
        self
    }

    #[must_use]
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Resolve `provider`, loading it from disk on first use
    pub async fn get(&self, provider: &str) -> Result<Arc<Provider>, ConfigError> {
        if !is_valid_provider_name(provider) {
            return Err(ConfigError::UnknownProvider(provider.to_string()));
        }
        let cached = self.cache.get(provider).map(|entry| Arc::clone(entry.value()));
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let file = self.read_file(provider).await?;
        let resolved = Arc::new(Provider::resolve(provider, file, &self.settings, &self.regions)?);
        info!(provider, base_url = resolved.base_url(), "Loaded provider configuration");

        Ok(Arc::clone(
            self.cache
                .entry(provider.to_string())
                .or_insert(resolved)
                .value(),
        ))
    }

    /// Register an in-memory provider, replacing any cached one with the same name
    pub fn register(&self, provider: &str, file: ProviderFile) -> Result<Arc<Provider>, ConfigError> {
        if !is_valid_provider_name(provider) {
            return Err(ConfigError::UnknownProvider(provider.to_string()));
        }
        let resolved = Arc::new(Provider::resolve(provider, file, &self.settings, &self.regions)?);
        self.cache.insert(provider.to_string(), Arc::clone(&resolved));
        debug!(provider, "Registered provider");
        Ok(resolved)
    }

    async fn read_file(&self, provider: &str) -> Result<ProviderFile, ConfigError> {
        let path = self.schema_dir.join(format!("{provider}.json"));
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::UnknownProvider(provider.to_string()));
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    provider: provider.to_string(),
                    path,
                    source,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|source| ConfigError::InvalidJson {
            provider: provider.to_string(),
            source,
        })
    }
}
