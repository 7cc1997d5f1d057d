//! Environment loading and derived configuration for `Settings`

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::types::Settings;
use crate::browser_pool::{PoolConfig, PoolError};

/// Prefix of every environment variable read by [`Settings::from_env`]
pub const ENV_PREFIX: &str = "SEARCHPOOL_";

impl Settings {
    /// Read `SEARCHPOOL_*` variables over the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut settings = Self::default();

        if let Some(region) = var("REGION") {
            settings.region = region.to_lowercase();
        }
        if let Some(proxy) = var("PROXY") {
            settings.proxy = Some(proxy);
        }
        if let Some(user_agent) = var("USER_AGENT") {
            settings.user_agent = user_agent;
        }
        if let Some(mode) = var("USER_AGENT_MODE") {
            settings.user_agent_mode = Some(mode);
        }
        if let Some(language) = var("LANGUAGE") {
            settings.language = language;
        }
        if let Some(headless) = var("HEADLESS") {
            settings.headless = parse_bool(&headless).context("SEARCHPOOL_HEADLESS")?;
        }
        if let Some(dir) = var("SCHEMA_DIR") {
            settings.schema_dir = PathBuf::from(dir);
        }
        if let Some(min) = var("POOL_MIN_SIZE") {
            settings.pool_min_size = parse_number(&min).context("SEARCHPOOL_POOL_MIN_SIZE")?;
        }
        if let Some(max) = var("POOL_MAX_SIZE") {
            settings.pool_max_size = parse_number(&max).context("SEARCHPOOL_POOL_MAX_SIZE")?;
        }
        if let Some(secs) = var("IDLE_TIMEOUT_SECS") {
            settings.idle_timeout =
                Duration::from_secs(parse_number(&secs).context("SEARCHPOOL_IDLE_TIMEOUT_SECS")?);
        }
        if let Some(url) = var("HEALTH_CHECK_URL") {
            settings.health_check_url = url;
        }
        if let Some(level) = var("LOG_LEVEL") {
            settings.log_level = level.to_lowercase();
        }

        Ok(settings)
    }

    /// Pool configuration derived from these settings
    pub fn pool_config(&self) -> Result<PoolConfig, PoolError> {
        PoolConfig::builder()
            .min_size(self.pool_min_size)
            .max_size(self.pool_max_size)
            .idle_timeout(self.idle_timeout)
            .health_check_url(self.health_check_url.clone())
            .build()
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("expected a boolean, got '{other}'")),
    }
}

fn parse_number<T>(raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("expected a number, got '{raw}'"))
}
