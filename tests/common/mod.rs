//! Shared helpers: an in-memory renderer and provider fixtures

#![allow(dead_code)]

use parking_lot::Mutex;
use searchpool::{
    FetchRequest, InstancePool, PaginationType, PoolConfig, ProviderConfig, ProviderFile,
    ProviderRegistry, Record, RegionTable, RenderHandle, RendererError, RendererFactory,
    SearchField, SearchSchema, Settings, FieldType,
};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const HEALTH_URL: &str = "mock://health";
pub const TEST_PROVIDER: &str = "p";
pub const TEST_BASE_URL: &str = "http://search.test";

/// Scripted result of one fetch
#[derive(Debug, Clone)]
pub enum Scripted {
    Records(Vec<Record>),
    Empty,
    Fail(RendererError),
}

/// Counters and switches shared by a `MockRenderer` and all its handles
#[derive(Debug, Default)]
pub struct MockState {
    pub created: AtomicUsize,
    pub destroyed: AtomicUsize,
    pub probes: AtomicUsize,
    pub fetches: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    /// Remaining `create()` calls that fail
    pub failing_creates: AtomicUsize,
    pub all_unhealthy: AtomicBool,
    /// `destroy()` panics while set
    pub panic_on_destroy: AtomicBool,
    pub unhealthy: Mutex<HashSet<u64>>,
    pub create_delay: Mutex<Duration>,
    pub fetch_delay: Mutex<Duration>,
    /// Consumed in order; once empty, `default_records` applies
    pub script: Mutex<VecDeque<Scripted>>,
    /// Records returned when the script is empty (0 means no content)
    pub default_records: AtomicUsize,
    pub requests: Mutex<Vec<FetchRequest>>,
    pub next_id: AtomicUsize,
}

impl MockState {
    pub fn live(&self) -> usize {
        self.created.load(Ordering::SeqCst) - self.destroyed.load(Ordering::SeqCst)
    }

    pub fn push(&self, outcome: Scripted) {
        self.script.lock().push_back(outcome);
    }

    pub fn mark_unhealthy(&self, id: u64) {
        self.unhealthy.lock().insert(id);
    }

    pub fn request_urls(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.url.clone()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockRenderer {
    pub state: Arc<MockState>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RendererFactory for MockRenderer {
    type Handle = MockHandle;

    async fn create(&self) -> Result<MockHandle, RendererError> {
        let delay = *self.state.create_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let failing = self.state.failing_creates.load(Ordering::SeqCst);
        if failing > 0 {
            self.state.failing_creates.store(failing - 1, Ordering::SeqCst);
            return Err(RendererError::Launch("mock launch failure".to_string()));
        }
        self.state.created.fetch_add(1, Ordering::SeqCst);
        Ok(MockHandle {
            id: self.state.next_id.fetch_add(1, Ordering::SeqCst) as u64,
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Debug)]
pub struct MockHandle {
    id: u64,
    state: Arc<MockState>,
}

impl RenderHandle for MockHandle {
    fn id(&self) -> u64 {
        self.id
    }

    async fn probe(&self, url: &str, _timeout: Duration) -> bool {
        self.state.probes.fetch_add(1, Ordering::SeqCst);
        url == HEALTH_URL
            && !self.state.all_unhealthy.load(Ordering::SeqCst)
            && !self.state.unhealthy.lock().contains(&self.id)
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Option<Vec<Record>>, RendererError> {
        self.state.fetches.fetch_add(1, Ordering::SeqCst);
        self.state.requests.lock().push(request.clone());

        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.state.fetch_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self.state.script.lock().pop_front();
        match scripted {
            Some(Scripted::Records(records)) => Ok(Some(records)),
            Some(Scripted::Empty) => Ok(None),
            Some(Scripted::Fail(e)) => Err(e),
            None => match self.state.default_records.load(Ordering::SeqCst) {
                0 => Ok(None),
                n => Ok(Some(records(n, &request.url))),
            },
        }
    }

    async fn destroy(self) -> Result<(), RendererError> {
        if self.state.panic_on_destroy.load(Ordering::SeqCst) {
            panic!("mock destroy failure for instance {}", self.id);
        }
        self.state.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// `n` records with a title and a unique url under `prefix`
pub fn records(n: usize, prefix: &str) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let mut record = Record::new();
            record.insert("title".to_string(), Value::String(format!("Result {i}")));
            record.insert("url".to_string(), Value::String(format!("{prefix}#{i}")));
            record
        })
        .collect()
}

pub fn pool_config(min: usize, max: usize) -> PoolConfig {
    PoolConfig::builder()
        .min_size(min)
        .max_size(max)
        .health_check_url(HEALTH_URL)
        .health_check_timeout(Duration::from_secs(1))
        .build()
        .expect("valid pool config")
}

pub fn mock_pool(min: usize, max: usize) -> (InstancePool<MockRenderer>, Arc<MockState>) {
    let renderer = MockRenderer::new();
    let state = Arc::clone(&renderer.state);
    let pool = InstancePool::new(renderer, pool_config(min, max)).expect("valid pool");
    (pool, state)
}

pub fn provider_file(pagination_type: PaginationType, max_results_per_page: usize) -> ProviderFile {
    let param = pagination_type.default_param();
    ProviderFile {
        config: ProviderConfig {
            name: String::new(),
            url_template: format!("/search?q={{kw}}&{param}={{{param}}}&n={{number}}&t={{timestamp}}"),
            pagination_type,
            pagination_param: String::new(),
            wait_for: "css:#results".to_string(),
            page_timeout: 5_000,
            user_agent: None,
            user_agent_mode: None,
            headers: None,
            proxy: None,
            js_code: None,
            max_results_per_page,
        },
        schema: SearchSchema {
            base_selector: "li.result".to_string(),
            fields: vec![
                SearchField {
                    name: "title".to_string(),
                    selector: "a".to_string(),
                    field_type: FieldType::Text,
                    attribute: None,
                },
                SearchField {
                    name: "url".to_string(),
                    selector: "a".to_string(),
                    field_type: FieldType::Attribute,
                    attribute: Some("href".to_string()),
                },
            ],
            error_selectors: Vec::new(),
        },
    }
}

pub fn test_regions() -> RegionTable {
    let mut regions = RegionTable::builtin();
    regions.insert(TEST_PROVIDER, "com", TEST_BASE_URL);
    regions
}

/// Registry holding only the in-memory test provider
pub fn test_registry(file: ProviderFile) -> Arc<ProviderRegistry> {
    let settings = Settings::default();
    let registry = ProviderRegistry::new(std::env::temp_dir().join("searchpool-no-schema"), &settings)
        .with_regions(test_regions());
    registry
        .register(TEST_PROVIDER, file)
        .expect("valid test provider");
    Arc::new(registry)
}

/// Query-string value of `key` in `url`
pub fn query_param(url: &str, key: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
