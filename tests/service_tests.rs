//! Search service surface: lifecycle and response envelopes

use searchpool::{PaginationType, PoolError, SearchQuery, SearchService, Settings};
use std::sync::atomic::Ordering;
use std::time::Duration;

mod common;

use common::{MockRenderer, TEST_PROVIDER, mock_pool, provider_file, test_registry};

fn service(min: usize, max: usize) -> (SearchService<MockRenderer>, std::sync::Arc<common::MockState>) {
    let (pool, state) = mock_pool(min, max);
    let registry = test_registry(provider_file(PaginationType::Offset, 10));
    let service = SearchService::from_parts(Settings::default(), pool, registry)
        .with_extractor(|extractor| extractor.with_request_delay(Duration::ZERO));
    (service, state)
}

#[tokio::test]
async fn test_lifecycle() {
    let (service, state) = service(2, 3);
    service.initialize().await.expect("init");
    assert_eq!(service.status().idle, 2);
    assert!(service.pool().is_initialized());

    service.close().await;
    assert!(service.status().closed);
    assert_eq!(state.live(), 0);
}

#[tokio::test]
async fn test_search_response_success_envelope() {
    let (service, state) = service(1, 1);
    state.default_records.store(4, Ordering::SeqCst);
    service.initialize().await.expect("init");

    let query = SearchQuery::new(TEST_PROVIDER, "rust").count(4);
    let response = service.search_response(&query).await;
    assert!(response.is_success());
    assert_eq!(response.data.as_ref().map(Vec::len), Some(4));

    let json = serde_json::to_value(&response).expect("serialize");
    assert_eq!(json["code"], 200);
    assert!(json.get("message").is_none());
    assert_eq!(json["data"][0]["title"], "Result 0");

    service.close().await;
}

#[tokio::test]
async fn test_search_response_failure_envelopes() {
    let (service, _state) = service(1, 1);

    let unknown = service
        .search_response(&SearchQuery::new("nope", "rust"))
        .await;
    assert_eq!(unknown.code, 404);
    assert!(unknown.data.is_none());
    assert!(unknown.message.as_deref().is_some_and(|m| m.contains("nope")));

    let invalid = service
        .search_response(&SearchQuery::new(TEST_PROVIDER, " ").page(1))
        .await;
    assert_eq!(invalid.code, 400);

    service.close().await;
    let closed = service
        .search_response(&SearchQuery::new(TEST_PROVIDER, "rust"))
        .await;
    assert_eq!(closed.code, 503);
}

#[tokio::test]
async fn test_query_deserializes_with_aliases() {
    let query: SearchQuery =
        serde_json::from_str(r#"{"provider": "bing", "kw": "rust", "number": 25}"#)
            .expect("valid query");
    assert_eq!(query.keyword, "rust");
    assert_eq!(query.count, 25);
    assert_eq!(query.page, 1);
}

#[test]
fn test_new_validates_pool_settings() {
    let settings = Settings {
        pool_min_size: 0,
        ..Settings::default()
    };
    let Err(err) = SearchService::new(settings, MockRenderer::new()) else {
        panic!("min_size 0 must be rejected");
    };
    assert!(matches!(err, PoolError::InvalidConfig(_)));

    let service = SearchService::new(Settings::default(), MockRenderer::new())
        .expect("defaults are valid");
    assert_eq!(service.registry().schema_dir(), Settings::default().schema_dir.as_path());
    assert_eq!(service.pool().config().max_size, 10);
}
