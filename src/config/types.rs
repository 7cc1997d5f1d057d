use std::path::PathBuf;
use std::time::Duration;

use crate::utils::constants::{
    CHROME_USER_AGENT, DEFAULT_HEALTH_CHECK_URL, DEFAULT_IDLE_TIMEOUT, DEFAULT_POOL_MAX_SIZE,
    DEFAULT_POOL_MIN_SIZE, DEFAULT_REGION,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Region code used to pick provider base URLs
    pub region: String,
    /// Browser-wide proxy, also the default for providers without one
    pub proxy: Option<String>,
    pub user_agent: String,
    /// `"random"` rotates user agents per request
    pub user_agent_mode: Option<String>,
    pub language: String,
    pub headless: bool,
    /// Directory holding `<provider>.json` files
    pub schema_dir: PathBuf,
    pub pool_min_size: usize,
    pub pool_max_size: usize,
    pub idle_timeout: Duration,
    pub health_check_url: String,
    /// Filter directive for the binary's subscriber, e.g. `info` or `searchpool=debug`
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            proxy: None,
            user_agent: CHROME_USER_AGENT.to_string(),
            user_agent_mode: None,
            language: "en-US".to_string(),
            headless: true,
            schema_dir: PathBuf::from("./schema"),
            pool_min_size: DEFAULT_POOL_MIN_SIZE,
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            health_check_url: DEFAULT_HEALTH_CHECK_URL.to_string(),
            log_level: "info".to_string(),
        }
    }
}
