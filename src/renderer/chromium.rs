//! Chromium renderer over `chromiumoxide`
//!
//! One handle owns one browser process, its CDP handler task and its profile
//! directory. Pages are opened per probe/fetch and always closed again.

use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::extract::extract_records;
use super::launch::launch_browser;
use super::profile::{create_profile_in, create_unique_profile};
use super::{FetchRequest, Record, RenderHandle, RendererError, RendererFactory, WaitCondition};
use crate::config::Settings;
use crate::utils::constants::{CHROME_USER_AGENT, WAIT_POLL_INTERVAL};
use crate::utils::with_timeout;

/// Upper bound for a graceful browser close before we give up and kill it
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Launch options shared by every browser the factory creates
#[derive(Debug, Clone)]
pub struct ChromiumRendererConfig {
    pub headless: bool,
    /// Applied as `--proxy-server`; proxies are per process in Chromium
    pub proxy: Option<String>,
    pub user_agent: String,
    pub language: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Skip discovery and use this executable
    pub executable: Option<PathBuf>,
    /// Parent directory for profiles (system temp dir when `None`)
    pub profile_root: Option<PathBuf>,
}

impl Default for ChromiumRendererConfig {
    fn default() -> Self {
        Self {
            headless: true,
            proxy: None,
            user_agent: CHROME_USER_AGENT.to_string(),
            language: "en-US".to_string(),
            window_width: 1280,
            window_height: 720,
            executable: None,
            profile_root: None,
        }
    }
}

impl ChromiumRendererConfig {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            headless: settings.headless,
            proxy: settings.proxy.clone(),
            user_agent: settings.user_agent.clone(),
            language: settings.language.clone(),
            ..Self::default()
        }
    }
}

/// Factory that launches one Chromium process per handle
#[derive(Debug)]
pub struct ChromiumRenderer {
    config: ChromiumRendererConfig,
    next_id: AtomicU64,
}

impl ChromiumRenderer {
    #[must_use]
    pub fn new(config: ChromiumRendererConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(0),
        }
    }
}

impl RendererFactory for ChromiumRenderer {
    type Handle = ChromiumHandle;

    async fn create(&self) -> Result<ChromiumHandle, RendererError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let profile = match &self.config.profile_root {
            Some(root) => create_profile_in(root),
            None => create_unique_profile(),
        }
        .map_err(|e| RendererError::Launch(format!("{e:#}")))?;

        let (browser, handler) = launch_browser(&self.config, profile.path())
            .await
            .map_err(|e| RendererError::Launch(format!("{e:#}")))?;

        info!(instance = id, "Launched browser instance");
        Ok(ChromiumHandle {
            id,
            browser,
            handler,
            profile_dir: Some(profile.into_path()),
        })
    }
}

/// A running browser process
#[derive(Debug)]
pub struct ChromiumHandle {
    id: u64,
    browser: Browser,
    handler: JoinHandle<()>,
    profile_dir: Option<PathBuf>,
}

impl ChromiumHandle {
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    fn cleanup_profile(&mut self) {
        if let Some(path) = self.profile_dir.take()
            && let Err(e) = std::fs::remove_dir_all(&path)
        {
            warn!("Failed to remove profile directory {}: {}", path.display(), e);
        }
    }

    async fn render(&self, page: &Page, request: &FetchRequest) -> Result<String, RendererError> {
        if let Some(user_agent) = &request.user_agent {
            page.execute(SetUserAgentOverrideParams {
                user_agent: user_agent.clone(),
                accept_language: None,
                platform: None,
                user_agent_metadata: None,
            })
            .await
            .map_err(|e| RendererError::Protocol(e.to_string()))?;
        }

        if !request.headers.is_empty() {
            let headers = serde_json::to_value(&request.headers)
                .map_err(|e| RendererError::Protocol(e.to_string()))?;
            page.execute(SetExtraHttpHeadersParams::new(Headers::new(headers)))
                .await
                .map_err(|e| RendererError::Protocol(e.to_string()))?;
        }

        page.goto(request.url.as_str())
            .await
            .map_err(|e| RendererError::Navigation {
                url: request.url.clone(),
                message: e.to_string(),
            })?;

        if let Some(script) = &request.script {
            page.evaluate(script.as_str())
                .await
                .map_err(|e| RendererError::Script(e.to_string()))?;
        }

        wait_until(page, &request.wait_for).await;

        page.content()
            .await
            .map_err(|e| RendererError::Protocol(e.to_string()))
    }
}

impl RenderHandle for ChromiumHandle {
    fn id(&self) -> u64 {
        self.id
    }

    async fn probe(&self, url: &str, timeout: Duration) -> bool {
        let check = async {
            let page = PageGuard::new(self.browser.new_page("about:blank").await?);
            let outcome = page.page.goto(url).await.map(|_| ());
            page.close().await;
            outcome
        };

        match tokio::time::timeout(timeout, check).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(instance = self.id, "Health probe failed: {}", e);
                false
            }
            Err(_) => {
                warn!(instance = self.id, "Health probe timed out after {:?}", timeout);
                false
            }
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Option<Vec<Record>>, RendererError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RendererError::Protocol(e.to_string()))?;
        let page = PageGuard::new(page);

        let operation = format!("Fetching {}", request.url);
        let rendered = with_timeout(self.render(&page.page, request), request.timeout, &operation).await;
        page.close().await;
        let html = rendered?;

        let records = extract_records(&html, &request.schema);
        debug!(
            instance = self.id,
            url = %request.url,
            "Extracted {} records from {} bytes",
            records.len(),
            html.len()
        );

        if records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(records))
        }
    }

    async fn destroy(mut self) -> Result<(), RendererError> {
        let closed = match tokio::time::timeout(CLOSE_TIMEOUT, self.browser.close()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(RendererError::Protocol(format!("close failed: {e}"))),
            Err(_) => Err(RendererError::Timeout {
                operation: "Closing browser".to_string(),
                after: CLOSE_TIMEOUT,
            }),
        };

        if closed.is_err() {
            // The process is unresponsive; Browser::kill reaps it
            let _ = self.browser.kill().await;
        }
        if let Err(e) = self.browser.wait().await {
            warn!(instance = self.id, "Failed to wait for browser exit: {}", e);
        }

        self.handler.abort();
        self.cleanup_profile();
        info!(instance = self.id, "Destroyed browser instance");
        closed
    }
}

impl Drop for ChromiumHandle {
    fn drop(&mut self) {
        self.handler.abort();
        if self.profile_dir.is_some() {
            warn!(
                instance = self.id,
                "Browser handle dropped without destroy() - removing profile in Drop"
            );
            self.cleanup_profile();
        }
    }
}

/// Closes its page on every exit path
struct PageGuard {
    page: Page,
    closed: bool,
}

impl PageGuard {
    fn new(page: Page) -> Self {
        Self {
            page,
            closed: false,
        }
    }

    async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.page.clone().close().await {
            debug!("Failed to close page: {}", e);
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let page = self.page.clone();
            runtime.spawn(async move {
                let _ = page.close().await;
            });
        }
    }
}

/// Poll until `condition` holds. The caller bounds this with the fetch timeout.
async fn wait_until(page: &Page, condition: &WaitCondition) {
    match condition {
        WaitCondition::None => {}
        WaitCondition::Css(selector) => {
            while page.find_element(selector.as_str()).await.is_err() {
                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
            }
        }
        WaitCondition::Js(expression) => {
            let script = format!(
                "(() => {{ const c = ({expression}); return Boolean(typeof c === 'function' ? c() : c); }})()"
            );
            loop {
                let satisfied = match page.evaluate(script.as_str()).await {
                    Ok(result) => result.into_value::<bool>().unwrap_or(false),
                    Err(e) => {
                        debug!("Wait condition evaluation failed: {}", e);
                        false
                    }
                };
                if satisfied {
                    break;
                }
                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
            }
        }
    }
}
