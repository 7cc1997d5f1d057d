//! Provider file data model
//!
//! One JSON file per provider: `{ "config": ProviderConfig, "schema": SearchSchema }`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::utils::constants::{
    DEFAULT_MAX_RESULTS_PER_PAGE, DEFAULT_PAGE_TIMEOUT_MS, ZERO_PAGE_TIMEOUT_FALLBACK_MS,
};

/// How a provider advances through result pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationType {
    /// Page index, e.g. `page=2`
    Page,
    /// Result offset, e.g. `first=10`
    #[default]
    Offset,
}

impl PaginationType {
    /// Parameter name used when the provider does not override it
    #[must_use]
    pub fn default_param(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Offset => "offset",
        }
    }
}

/// How a field's value is read from the matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Trimmed text content
    Text,
    /// Value of the field's `attribute`
    Attribute,
    /// Inner HTML
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchField {
    pub name: String,
    pub selector: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

/// CSS extraction schema: one record per `base_selector` match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSchema {
    pub base_selector: String,
    pub fields: Vec<SearchField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_selectors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Defaults to the provider file name
    #[serde(default)]
    pub name: String,

    /// Path template appended to the region base URL
    pub url_template: String,

    #[serde(default)]
    pub pagination_type: PaginationType,

    /// Empty means `PaginationType::default_param`
    #[serde(default)]
    pub pagination_param: String,

    /// `css:<selector>`, `js:<expression>` or a bare selector
    #[serde(default)]
    pub wait_for: String,

    /// Milliseconds. `0` means the short fallback timeout.
    #[serde(default = "default_page_timeout")]
    pub page_timeout: u64,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// `"random"` rotates user agents per request
    #[serde(default)]
    pub user_agent_mode: Option<String>,

    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    #[serde(default)]
    pub proxy: Option<String>,

    /// Script run after navigation; `{number}` expands to the per-request count
    #[serde(default)]
    pub js_code: Option<String>,

    #[serde(default = "default_max_results_per_page")]
    pub max_results_per_page: usize,
}

fn default_page_timeout() -> u64 {
    DEFAULT_PAGE_TIMEOUT_MS
}

fn default_max_results_per_page() -> usize {
    DEFAULT_MAX_RESULTS_PER_PAGE
}

impl ProviderConfig {
    #[must_use]
    pub fn pagination_param(&self) -> &str {
        if self.pagination_param.is_empty() {
            self.pagination_type.default_param()
        } else {
            &self.pagination_param
        }
    }

    #[must_use]
    pub fn page_timeout(&self) -> Duration {
        match self.page_timeout {
            0 => Duration::from_millis(ZERO_PAGE_TIMEOUT_FALLBACK_MS),
            ms => Duration::from_millis(ms),
        }
    }
}

/// On-disk provider file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFile {
    pub config: ProviderConfig,
    pub schema: SearchSchema,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_file_defaults() {
        let file: ProviderFile = serde_json::from_str(
            r#"{
                "config": { "url_template": "/search?q={kw}&first={offset}" },
                "schema": {
                    "base_selector": "li.b_algo",
                    "fields": [{ "name": "title", "selector": "h2", "type": "text" }]
                }
            }"#,
        )
        .expect("valid provider file");

        assert_eq!(file.config.pagination_type, PaginationType::Offset);
        assert_eq!(file.config.pagination_param(), "offset");
        assert_eq!(file.config.page_timeout(), Duration::from_secs(60));
        assert_eq!(file.config.max_results_per_page, 10);
        assert!(file.schema.error_selectors.is_empty());
        assert_eq!(file.schema.fields[0].field_type, FieldType::Text);
    }

    #[test]
    fn test_zero_page_timeout_uses_fallback() {
        let config: ProviderConfig = serde_json::from_str(
            r#"{ "url_template": "/s?wd={kw}&pn={page}", "pagination_type": "page", "page_timeout": 0 }"#,
        )
        .expect("valid config");
        assert_eq!(config.page_timeout(), Duration::from_secs(30));
        assert_eq!(config.pagination_param(), "page");
    }

    #[test]
    fn test_explicit_pagination_param_wins() {
        let config: ProviderConfig = serde_json::from_str(
            r#"{ "url_template": "/search?q={kw}&first={first}", "pagination_param": "first" }"#,
        )
        .expect("valid config");
        assert_eq!(config.pagination_param(), "first");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config: ProviderConfig = serde_json::from_str(
            r#"{ "url_template": "/q?{kw}", "browser_type": "chromium", "headless": true, "click_load": null }"#,
        )
        .expect("legacy keys tolerated");
        assert!(config.headers.is_none());
    }
}
