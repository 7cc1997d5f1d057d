//! Idle reaper behavior on a paused clock

use searchpool::{InstancePool, PooledInstance};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

mod common;

use common::{MockRenderer, MockState, pool_config};

const IDLE_TIMEOUT: Duration = Duration::from_secs(10);
const REAP_INTERVAL: Duration = Duration::from_secs(1);

fn reaping_pool(min: usize, max: usize) -> (InstancePool<MockRenderer>, Arc<MockState>) {
    let renderer = MockRenderer::new();
    let state = Arc::clone(&renderer.state);
    let mut config = pool_config(min, max);
    config.idle_timeout = IDLE_TIMEOUT;
    config.reap_interval = REAP_INTERVAL;
    let pool = InstancePool::new(renderer, config).expect("valid pool");
    (pool, state)
}

async fn grow_to(pool: &InstancePool<MockRenderer>, n: usize) {
    let mut held: Vec<PooledInstance<MockRenderer>> = Vec::new();
    for _ in 0..n {
        held.push(pool.acquire().await.expect("acquire"));
    }
    for instance in held {
        instance.release().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_reaps_expired_instances_down_to_min() {
    let (pool, state) = reaping_pool(1, 4);
    pool.initialize().await.expect("init");
    grow_to(&pool, 4).await;
    assert_eq!(pool.status().idle, 4);

    tokio::time::sleep(IDLE_TIMEOUT + REAP_INTERVAL * 3).await;

    let status = pool.status();
    assert_eq!(status.active, 1);
    assert_eq!(status.idle, 1);
    assert_eq!(state.destroyed.load(Ordering::SeqCst), 3);

    // The floor holds no matter how long the last instance idles
    tokio::time::sleep(IDLE_TIMEOUT * 5).await;
    assert_eq!(pool.status().active, 1);

    pool.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_nothing_reaped_before_idle_timeout() {
    let (pool, state) = reaping_pool(1, 3);
    pool.initialize().await.expect("init");
    grow_to(&pool, 3).await;

    tokio::time::sleep(IDLE_TIMEOUT / 2).await;
    assert_eq!(pool.status().active, 3);
    assert_eq!(state.destroyed.load(Ordering::SeqCst), 0);

    pool.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_recently_used_instance_survives() {
    let (pool, _state) = reaping_pool(1, 3);
    pool.initialize().await.expect("init");
    grow_to(&pool, 3).await;

    tokio::time::sleep(IDLE_TIMEOUT - Duration::from_secs(2)).await;
    let touched = pool.acquire().await.expect("acquire");
    let touched_id = touched.id();
    touched.release().await;

    tokio::time::sleep(Duration::from_secs(4)).await;
    let status = pool.status();
    assert_eq!(status.active, 1);

    let survivor = pool.acquire().await.expect("acquire");
    assert_eq!(survivor.id(), touched_id);
    survivor.release().await;
    pool.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_checked_out_instances_are_not_reaped() {
    let (pool, state) = reaping_pool(1, 3);
    pool.initialize().await.expect("init");
    grow_to(&pool, 3).await;
    let a = pool.acquire().await.expect("acquire");
    let b = pool.acquire().await.expect("acquire");

    tokio::time::sleep(IDLE_TIMEOUT * 2).await;

    // Only the idle one above the floor could go, but a and b count toward it
    let status = pool.status();
    assert_eq!(status.checked_out, 2);
    assert_eq!(status.active, 2);
    assert_eq!(state.destroyed.load(Ordering::SeqCst), 1);

    a.release().await;
    b.release().await;
    pool.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_panicking_destroy_still_frees_slots() {
    let (pool, state) = reaping_pool(1, 3);
    pool.initialize().await.expect("init");
    grow_to(&pool, 3).await;
    state.panic_on_destroy.store(true, Ordering::SeqCst);

    tokio::time::sleep(IDLE_TIMEOUT + REAP_INTERVAL * 3).await;

    let status = pool.status();
    assert_eq!(status.active, 1);
    assert_eq!(status.idle, 1);
    assert_eq!(status.checked_out, 0);
    assert_eq!(state.destroyed.load(Ordering::SeqCst), 0);

    // Full capacity is available again
    state.panic_on_destroy.store(false, Ordering::SeqCst);
    let mut held = Vec::new();
    for _ in 0..3 {
        let instance = tokio::time::timeout(Duration::from_secs(1), pool.acquire())
            .await
            .expect("slot was freed")
            .expect("acquire");
        held.push(instance);
    }
    for instance in held {
        instance.release().await;
    }
    pool.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_reaper() {
    let (pool, state) = reaping_pool(1, 3);
    pool.initialize().await.expect("init");
    grow_to(&pool, 3).await;

    tokio::time::timeout(Duration::from_secs(1), pool.close())
        .await
        .expect("close does not wait for a reaper tick");
    let destroyed = state.destroyed.load(Ordering::SeqCst);
    assert_eq!(destroyed, 3);

    tokio::time::sleep(IDLE_TIMEOUT * 3).await;
    assert_eq!(state.destroyed.load(Ordering::SeqCst), destroyed);
}
