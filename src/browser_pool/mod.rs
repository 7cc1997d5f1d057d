//! Instance Pool
//!
//! A bounded pool of renderer handles shared across concurrent callers.
//!
//! # Accounting
//!
//! All bookkeeping lives in one [`PoolState`] behind a `parking_lot` mutex that
//! is never held across an await. `active` counts every live handle and `in_use`
//! counts the ones not sitting in the idle queue (checked out, being created for
//! a caller, or being destroyed), so `active == idle.len() + in_use` holds
//! whenever the lock is free.
//!
//! # Waiting
//!
//! When the pool is at `max_size` with nothing idle, `acquire()` enqueues a
//! oneshot sender in an explicit FIFO. A release hands its instance (or, if the
//! instance was destroyed, its capacity) straight to the oldest live waiter.

mod config;
mod error;
mod instance;
mod reaper;

pub use config::{PoolConfig, PoolConfigBuilder, ShutdownPolicy};
pub use error::PoolError;
pub use instance::PooledInstance;

use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::renderer::{RenderHandle, RendererFactory};
use instance::{Handoff, Instance, SlotReservation, Waiter};

/// Point-in-time view of the pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Live instances: idle + checked out
    pub active: usize,
    pub idle: usize,
    /// Instances held by callers, being created for them, or being destroyed
    pub checked_out: usize,
    /// Callers blocked in `acquire()`
    pub waiters: usize,
    pub initialized: bool,
    pub closed: bool,
}

struct PoolState<H> {
    idle: VecDeque<Instance<H>>,
    waiters: VecDeque<oneshot::Sender<Handoff<H>>>,
    active: usize,
    in_use: usize,
    initialized: bool,
    closed: bool,
}

impl<H> PoolState<H> {
    fn new() -> Self {
        Self {
            idle: VecDeque::new(),
            waiters: VecDeque::new(),
            active: 0,
            in_use: 0,
            initialized: false,
            closed: false,
        }
    }

    /// Give `handoff` to the oldest waiter that is still listening
    fn offer(&mut self, mut handoff: Handoff<H>) -> Option<Handoff<H>> {
        while let Some(waiter) = self.waiters.pop_front() {
            match waiter.send(handoff) {
                Ok(()) => return None,
                Err(returned) => handoff = returned,
            }
        }
        Some(handoff)
    }
}

struct ReaperTask {
    token: CancellationToken,
    join: JoinHandle<()>,
}

struct PoolInner<F: RendererFactory> {
    factory: F,
    config: PoolConfig,
    state: Mutex<PoolState<F::Handle>>,
    init_lock: tokio::sync::Mutex<()>,
    reaper: Mutex<Option<ReaperTask>>,
    drained: Notify,
}

impl<F: RendererFactory> PoolInner<F> {
    /// Return a caller-side instance to a waiter or the idle queue.
    ///
    /// Gives the instance back when it has to be destroyed instead (pool closed
    /// or idle queue full).
    fn check_in(&self, instance: Instance<F::Handle>) -> Option<Instance<F::Handle>> {
        let mut state = self.state.lock();
        if state.closed {
            return Some(instance);
        }
        let Some(Handoff::Instance(instance)) = state.offer(Handoff::Instance(instance)) else {
            return None;
        };
        if state.idle.len() >= self.config.max_size {
            return Some(instance);
        }
        state.in_use = state.in_use.saturating_sub(1);
        state.idle.push_back(instance);
        if state.in_use == 0 {
            self.drained.notify_waiters();
        }
        None
    }

    /// Account for a caller-side instance that no longer exists.
    ///
    /// The capacity goes to the oldest waiter if there is one.
    fn free_slot(&self) {
        let mut state = self.state.lock();
        if state.offer(Handoff::Slot).is_none() {
            return;
        }
        state.active = state.active.saturating_sub(1);
        state.in_use = state.in_use.saturating_sub(1);
        if state.in_use == 0 {
            self.drained.notify_waiters();
        }
    }
}

/// Bounded, auto-scaling pool of renderer handles.
///
/// Cheap to clone; all clones share one pool.
pub struct InstancePool<F: RendererFactory> {
    inner: Arc<PoolInner<F>>,
}

impl<F: RendererFactory> Clone for InstancePool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: RendererFactory> std::fmt::Debug for InstancePool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstancePool")
            .field("config", &self.inner.config)
            .field("status", &self.status())
            .finish()
    }
}

impl<F: RendererFactory> InstancePool<F> {
    /// Build an empty pool. No instance is created until `initialize()` or `acquire()`.
    pub fn new(factory: F, config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(PoolInner {
                factory,
                config,
                state: Mutex::new(PoolState::new()),
                init_lock: tokio::sync::Mutex::new(()),
                reaper: Mutex::new(None),
                drained: Notify::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn factory(&self) -> &F {
        &self.inner.factory
    }

    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state.lock();
        PoolStatus {
            active: state.active,
            idle: state.idle.len(),
            checked_out: state.in_use,
            waiters: state.waiters.iter().filter(|w| !w.is_closed()).count(),
            initialized: state.initialized,
            closed: state.closed,
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.state.lock().initialized
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Create `min_size` instances and start the idle reaper.
    ///
    /// Idempotent: concurrent callers serialize on an init lock and only the
    /// first does any work. A construction error is returned as-is; instances
    /// created before it stay in the pool.
    pub async fn initialize(&self) -> Result<(), PoolError> {
        let _init = self.inner.init_lock.lock().await;
        {
            let state = self.inner.state.lock();
            if state.closed {
                return Err(PoolError::Closed);
            }
            if state.initialized {
                return Ok(());
            }
        }

        let config = &self.inner.config;
        info!(
            min_size = config.min_size,
            max_size = config.max_size,
            "Initializing instance pool"
        );

        loop {
            let reservation = {
                let mut state = self.inner.state.lock();
                if state.closed {
                    return Err(PoolError::Closed);
                }
                if state.active >= config.min_size {
                    break;
                }
                state.active += 1;
                state.in_use += 1;
                SlotReservation::new(self.clone())
            };

            let handle = self.inner.factory.create().await?;
            reservation.disarm();
            debug!(instance = handle.id(), "Created warm instance");

            if let Some(instance) = self.inner.check_in(Instance::new(handle)) {
                self.discard(instance.handle).await;
            }
        }

        self.start_reaper();
        self.inner.state.lock().initialized = true;
        info!("Instance pool initialized");
        Ok(())
    }

    /// Check out one instance.
    ///
    /// Reuses an idle instance, else creates one below `max_size`, else waits
    /// in FIFO order for a release. There is no built-in timeout; wrap the call
    /// in `tokio::time::timeout` for a bounded wait. Dropping the future while
    /// waiting leaves the queue cleanly.
    pub async fn acquire(&self) -> Result<PooledInstance<F>, PoolError> {
        enum Next<H> {
            Ready(H),
            Create,
            Wait(oneshot::Receiver<Handoff<H>>),
        }

        let next = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Err(PoolError::Closed);
            }
            if let Some(instance) = state.idle.pop_front() {
                state.in_use += 1;
                Next::Ready(instance.handle)
            } else if state.active < self.inner.config.max_size {
                state.active += 1;
                state.in_use += 1;
                Next::Create
            } else {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Next::Wait(rx)
            }
        };

        match next {
            Next::Ready(handle) => {
                debug!(instance = handle.id(), "Acquired idle instance");
                Ok(PooledInstance::new(self.clone(), handle))
            }
            Next::Create => self.create_for_caller(SlotReservation::new(self.clone())).await,
            Next::Wait(rx) => {
                debug!(
                    max_size = self.inner.config.max_size,
                    "Pool at capacity, waiting for a release"
                );
                match Waiter::new(self.clone(), rx).wait().await? {
                    Handoff::Instance(instance) => {
                        debug!(instance = instance.handle.id(), "Acquired handed-off instance");
                        Ok(PooledInstance::new(self.clone(), instance.handle))
                    }
                    Handoff::Slot => {
                        self.create_for_caller(SlotReservation::new(self.clone()))
                            .await
                    }
                }
            }
        }
    }

    /// Stop the reaper and destroy every idle instance.
    ///
    /// Instances checked out at this point are destroyed when released. With
    /// [`ShutdownPolicy::AwaitCheckedOut`] this also waits for those releases.
    /// Calling `close()` again is a no-op.
    pub async fn close(&self) {
        let idle: Vec<Instance<F::Handle>> = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.initialized = false;
            // Dropping the senders wakes every waiter with `Closed`
            state.waiters.clear();
            let idle: Vec<_> = state.idle.drain(..).collect();
            state.in_use += idle.len();
            idle
        };
        info!(idle = idle.len(), "Closing instance pool");

        let reaper = self.inner.reaper.lock().take();
        if let Some(task) = reaper {
            task.token.cancel();
            if let Err(e) = task.join.await {
                warn!("Idle reaper ended abnormally: {}", e);
            }
        }

        futures::future::join_all(idle.into_iter().map(|instance| self.discard(instance.handle)))
            .await;

        match self.inner.config.shutdown_policy {
            ShutdownPolicy::Detach => {
                let remaining = self.inner.state.lock().in_use;
                if remaining > 0 {
                    warn!(
                        remaining,
                        "Instances still checked out at close; they are destroyed on release"
                    );
                }
            }
            ShutdownPolicy::AwaitCheckedOut { timeout } => self.await_checked_out(timeout).await,
        }

        info!("Instance pool closed");
    }

    async fn await_checked_out(&self, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.inner.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let remaining = self.inner.state.lock().in_use;
            if remaining == 0 {
                return;
            }
            debug!(remaining, "Waiting for checked-out instances");
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                warn!(
                    remaining = self.inner.state.lock().in_use,
                    "Timed out waiting for checked-out instances"
                );
                return;
            }
        }
    }

    async fn create_for_caller(
        &self,
        reservation: SlotReservation<F>,
    ) -> Result<PooledInstance<F>, PoolError> {
        let handle = match self.inner.factory.create().await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Failed to create instance: {}", e);
                return Err(PoolError::Construction(e));
            }
        };
        reservation.disarm();

        if self.is_closed() {
            self.discard(handle).await;
            return Err(PoolError::Closed);
        }

        info!(instance = handle.id(), "Created instance on demand");
        Ok(PooledInstance::new(self.clone(), handle))
    }

    /// Probe a returned handle and put it back, or destroy it
    pub(crate) async fn release_handle(&self, handle: F::Handle) {
        let id = handle.id();
        if self.is_closed() {
            debug!(instance = id, "Pool closed, destroying released instance");
            self.discard(handle).await;
            return;
        }

        let config = &self.inner.config;
        let healthy = tokio::time::timeout(
            config.health_check_timeout,
            handle.probe(&config.health_check_url, config.health_check_timeout),
        )
        .await
        .unwrap_or(false);

        if !healthy {
            warn!(instance = id, "Instance failed health check, destroying");
            self.discard(handle).await;
            return;
        }

        match self.inner.check_in(Instance::new(handle)) {
            None => debug!(instance = id, "Released instance"),
            Some(instance) => {
                debug!(instance = id, "Pool closed or full, destroying released instance");
                self.discard(instance.handle).await;
            }
        }
    }

    /// Destroy a caller-side handle and free its slot.
    ///
    /// The slot is freed even when `destroy` panics.
    async fn discard(&self, handle: F::Handle) {
        let id = handle.id();
        match AssertUnwindSafe(handle.destroy()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(instance = id, "Failed to destroy instance: {}", e),
            Err(_) => error!(instance = id, "Instance destroy panicked"),
        }
        self.inner.free_slot();
    }

    /// `discard` for contexts that cannot await
    pub(crate) fn discard_detached(&self, handle: F::Handle) {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let pool = self.clone();
                runtime.spawn(async move { pool.discard(handle).await });
            }
            Err(_) => {
                drop(handle);
                self.inner.free_slot();
            }
        }
    }

    fn start_reaper(&self) {
        let mut reaper = self.inner.reaper.lock();
        if reaper.is_some() {
            return;
        }
        let token = CancellationToken::new();
        let join = reaper::spawn(
            Arc::downgrade(&self.inner),
            token.clone(),
            self.inner.config.reap_interval,
        );
        *reaper = Some(ReaperTask { token, join });
    }

    /// One reaper pass: destroy idle instances past `idle_timeout`, never going below `min_size`.
    ///
    /// Returns the number of instances destroyed.
    pub(crate) async fn reap_idle(&self) -> usize {
        let config = &self.inner.config;
        let expired: Vec<Instance<F::Handle>> = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return 0;
            }
            let now = tokio::time::Instant::now();
            let mut budget = state.active.saturating_sub(config.min_size);
            let mut expired = Vec::new();
            let mut kept = VecDeque::with_capacity(state.idle.len());

            while let Some(instance) = state.idle.pop_front() {
                if budget > 0 && now.duration_since(instance.last_used) > config.idle_timeout {
                    budget -= 1;
                    expired.push(instance);
                } else {
                    kept.push_back(instance);
                }
            }
            state.idle = kept;
            state.in_use += expired.len();
            expired
        };

        let reaped = expired.len();
        for instance in expired {
            debug!(instance = instance.handle.id(), "Reaping idle instance");
            self.discard(instance.handle).await;
        }
        reaped
    }
}
