//! Shared constants for searchpool
//!
//! Default values used across the pool, the providers and the renderer.

use std::time::Duration;

/// Chrome user agent string used when neither the provider nor the process overrides it
///
/// Keep within a few stable releases of current Chrome.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

/// Pool of user agents for `user_agent_mode = "random"`
pub const RANDOM_USER_AGENTS: &[&str] = &[
    CHROME_USER_AGENT,
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.2 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:134.0) Gecko/20100101 Firefox/134.0",
];

/// Minimum number of live instances
pub const DEFAULT_POOL_MIN_SIZE: usize = 2;

/// Maximum number of live instances
pub const DEFAULT_POOL_MAX_SIZE: usize = 10;

/// Idle instances older than this are reaped (above the floor)
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Interval between reaper scans
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(60);

/// Budget for one health probe on release
pub const DEFAULT_HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Cheap page used by the health probe
pub const DEFAULT_HEALTH_CHECK_URL: &str = "https://www.baidu.com";

/// Provider page timeout when the provider file does not set one (ms)
pub const DEFAULT_PAGE_TIMEOUT_MS: u64 = 60_000;

/// Page timeout used when a provider sets `page_timeout: 0` (ms)
pub const ZERO_PAGE_TIMEOUT_FALLBACK_MS: u64 = 30_000;

/// Default `max_results_per_page` for providers
pub const DEFAULT_MAX_RESULTS_PER_PAGE: usize = 10;

/// Pause between consecutive provider requests within one search
pub const INTER_REQUEST_DELAY: Duration = Duration::from_millis(300);

/// Poll interval while waiting for a page's wait condition
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Longest accepted search keyword, in characters
pub const MAX_KEYWORD_LENGTH: usize = 500;

/// Region used when none is configured; also the fallback for region lookups
pub const DEFAULT_REGION: &str = "com";

/// Largest accepted result count for one search
pub const MAX_RESULT_COUNT: usize = 100;

/// Largest accepted starting result page
pub const MAX_PAGE: usize = 1_000;
