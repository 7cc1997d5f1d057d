//! Pool sizing, health checking and shutdown configuration

use std::time::Duration;

use super::PoolError;
use crate::utils::constants::{
    DEFAULT_HEALTH_CHECK_TIMEOUT, DEFAULT_HEALTH_CHECK_URL, DEFAULT_IDLE_TIMEOUT,
    DEFAULT_POOL_MAX_SIZE, DEFAULT_POOL_MIN_SIZE, DEFAULT_REAP_INTERVAL,
};

/// What `close()` does about instances still checked out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// Return immediately; checked-out instances are destroyed when released
    #[default]
    Detach,
    /// Wait until every checked-out instance is released, or `timeout` elapses
    AwaitCheckedOut { timeout: Duration },
}

/// Immutable pool configuration, validated once at pool construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Floor kept warm by `initialize()` and respected by the reaper
    pub min_size: usize,
    /// Hard ceiling on live instances (idle + checked out)
    pub max_size: usize,
    /// Idle time after which an instance above the floor is reaped
    pub idle_timeout: Duration,
    /// Page fetched by the health probe on release
    pub health_check_url: String,
    pub health_check_timeout: Duration,
    /// Sleep between reaper scans
    pub reap_interval: Duration,
    pub shutdown_policy: ShutdownPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_POOL_MIN_SIZE,
            max_size: DEFAULT_POOL_MAX_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            health_check_url: DEFAULT_HEALTH_CHECK_URL.to_string(),
            health_check_timeout: DEFAULT_HEALTH_CHECK_TIMEOUT,
            reap_interval: DEFAULT_REAP_INTERVAL,
            shutdown_policy: ShutdownPolicy::Detach,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.min_size == 0 {
            return Err(PoolError::InvalidConfig(
                "min_size must be greater than 0".to_string(),
            ));
        }
        if self.min_size > self.max_size {
            return Err(PoolError::InvalidConfig(format!(
                "min_size ({}) cannot exceed max_size ({})",
                self.min_size, self.max_size
            )));
        }
        if let Err(e) = url::Url::parse(&self.health_check_url) {
            return Err(PoolError::InvalidConfig(format!(
                "health_check_url '{}' is not a valid URL: {e}",
                self.health_check_url
            )));
        }
        if self.health_check_timeout.is_zero() {
            return Err(PoolError::InvalidConfig(
                "health_check_timeout must be non-zero".to_string(),
            ));
        }
        if self.idle_timeout.is_zero() {
            return Err(PoolError::InvalidConfig(
                "idle_timeout must be non-zero".to_string(),
            ));
        }
        if self.reap_interval.is_zero() {
            return Err(PoolError::InvalidConfig(
                "reap_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    #[must_use]
    pub fn min_size(mut self, min_size: usize) -> Self {
        self.config.min_size = min_size;
        self
    }

    #[must_use]
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.config.max_size = max_size;
        self
    }

    #[must_use]
    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.config.idle_timeout = idle_timeout;
        self
    }

    #[must_use]
    pub fn health_check_url(mut self, url: impl Into<String>) -> Self {
        self.config.health_check_url = url.into();
        self
    }

    #[must_use]
    pub fn health_check_timeout(mut self, timeout: Duration) -> Self {
        self.config.health_check_timeout = timeout;
        self
    }

    #[must_use]
    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.config.reap_interval = interval;
        self
    }

    #[must_use]
    pub fn shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.config.shutdown_policy = policy;
        self
    }

    pub fn build(self) -> Result<PoolConfig, PoolError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
