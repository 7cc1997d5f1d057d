//! Renderer handle contract
//!
//! A renderer handle is an expensive, stateful page-rendering engine (one
//! headless browser process for the Chromium implementation). The pool only
//! talks to handles through the two traits below, which keeps the pool and the
//! extraction protocol testable without a browser.

pub mod chromium;
mod error;
pub mod extract;
pub mod launch;
pub mod profile;

pub use chromium::{ChromiumRenderer, ChromiumRendererConfig};
pub use error::RendererError;

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::providers::SearchSchema;

/// One extracted item: field name to extracted value
pub type Record = Map<String, Value>;

/// Builds renderer handles for the pool
pub trait RendererFactory: Send + Sync + 'static {
    type Handle: RenderHandle;

    /// Construct a new handle. Slow (seconds for a real browser).
    fn create(&self) -> impl Future<Output = Result<Self::Handle, RendererError>> + Send;
}

/// A live renderer instance
pub trait RenderHandle: Send + Sync + 'static {
    /// Stable identifier, used in logs
    fn id(&self) -> u64;

    /// Cheap liveness check against `url`. Any failure counts as unhealthy.
    fn probe(&self, url: &str, timeout: Duration) -> impl Future<Output = bool> + Send;

    /// Render `request.url` and run the extraction schema over it.
    ///
    /// `Ok(None)` means the page produced no content.
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<Option<Vec<Record>>, RendererError>> + Send;

    /// Tear the instance down. Consumes the handle.
    fn destroy(self) -> impl Future<Output = Result<(), RendererError>> + Send;
}

/// Condition the renderer waits on before extracting
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WaitCondition {
    #[default]
    None,
    /// Wait until an element matching the selector exists
    Css(String),
    /// Wait until the JavaScript expression evaluates truthy
    Js(String),
}

impl WaitCondition {
    /// Parse the provider `wait_for` notation: `css:<selector>`, `js:<expression>`,
    /// a bare selector, or empty for no waiting.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::None;
        }
        if let Some(selector) = raw.strip_prefix("css:") {
            return Self::Css(selector.trim().to_string());
        }
        if let Some(expression) = raw.strip_prefix("js:") {
            return Self::Js(expression.trim().to_string());
        }
        Self::Css(raw.to_string())
    }
}

/// Everything a handle needs to render and extract one provider page
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub schema: Arc<SearchSchema>,
    pub wait_for: WaitCondition,
    pub timeout: Duration,
    /// Script evaluated after navigation, before waiting and extraction
    pub script: Option<String>,
    pub headers: HashMap<String, String>,
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_condition_parse() {
        assert_eq!(WaitCondition::parse(""), WaitCondition::None);
        assert_eq!(WaitCondition::parse("   "), WaitCondition::None);
        assert_eq!(
            WaitCondition::parse("css:#b_results"),
            WaitCondition::Css("#b_results".to_string())
        );
        assert_eq!(
            WaitCondition::parse("js:() => document.querySelectorAll('li').length > 3"),
            WaitCondition::Js("() => document.querySelectorAll('li').length > 3".to_string())
        );
        assert_eq!(
            WaitCondition::parse("article[data-testid='result']"),
            WaitCondition::Css("article[data-testid='result']".to_string())
        );
    }
}
