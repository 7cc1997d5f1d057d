//! Idle Reaper
//!
//! Background task that periodically shrinks the pool back toward `min_size`.
//! It holds only a weak reference so a pool dropped without `close()` still
//! lets the task end.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::{InstancePool, PoolInner};
use crate::renderer::RendererFactory;

pub(super) fn spawn<F: RendererFactory>(
    weak: Weak<PoolInner<F>>,
    token: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(?interval, "Idle reaper started");
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }

            let Some(inner) = weak.upgrade() else {
                break;
            };
            let pool = InstancePool { inner };

            // A panicking destroy must not take the reaper down with it
            match AssertUnwindSafe(pool.reap_idle()).catch_unwind().await {
                Ok(0) => {}
                Ok(reaped) => {
                    let status = pool.status();
                    info!(
                        reaped,
                        active = status.active,
                        idle = status.idle,
                        "Reaped idle instances"
                    );
                }
                Err(_) => error!("Idle reaper scan panicked, continuing"),
            }
        }
        debug!("Idle reaper stopped");
    })
}
