//! Instance bookkeeping: idle entries, waiter hand-off and the borrow scope

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{InstancePool, PoolError};
use crate::renderer::{FetchRequest, Record, RenderHandle, RendererError, RendererFactory};

/// An idle handle and the time it was last returned
#[derive(Debug)]
pub(crate) struct Instance<H> {
    pub(crate) handle: H,
    pub(crate) last_used: Instant,
}

impl<H> Instance<H> {
    pub(crate) fn new(handle: H) -> Self {
        Self {
            handle,
            last_used: Instant::now(),
        }
    }
}

/// What a releaser passes to the oldest waiter
pub(crate) enum Handoff<H> {
    /// A healthy instance, already counted as checked out
    Instance(Instance<H>),
    /// Capacity freed by a destroyed instance; the waiter creates its own
    Slot,
}

/// A counted slot whose handle is still being created.
///
/// Dropping it without `disarm()` gives the capacity back.
pub(crate) struct SlotReservation<F: RendererFactory> {
    pool: InstancePool<F>,
    armed: bool,
}

impl<F: RendererFactory> SlotReservation<F> {
    pub(crate) fn new(pool: InstancePool<F>) -> Self {
        Self { pool, armed: true }
    }

    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl<F: RendererFactory> Drop for SlotReservation<F> {
    fn drop(&mut self) {
        if self.armed {
            self.pool.inner.free_slot();
        }
    }
}

/// A queued `acquire()`.
///
/// If the waiting future is dropped after a hand-off was sent but before it
/// was received, the hand-off goes back to the pool.
pub(crate) struct Waiter<F: RendererFactory> {
    pool: InstancePool<F>,
    rx: oneshot::Receiver<Handoff<F::Handle>>,
}

impl<F: RendererFactory> Waiter<F> {
    pub(crate) fn new(pool: InstancePool<F>, rx: oneshot::Receiver<Handoff<F::Handle>>) -> Self {
        Self { pool, rx }
    }

    pub(crate) async fn wait(mut self) -> Result<Handoff<F::Handle>, PoolError> {
        // The sender is dropped only when close() clears the queue
        (&mut self.rx).await.map_err(|_| PoolError::Closed)
    }
}

impl<F: RendererFactory> Drop for Waiter<F> {
    fn drop(&mut self) {
        self.rx.close();
        match self.rx.try_recv() {
            Ok(Handoff::Instance(instance)) => {
                debug!(instance = instance.handle.id(), "Waiter gone, returning hand-off");
                if let Some(instance) = self.pool.inner.check_in(instance) {
                    self.pool.discard_detached(instance.handle);
                }
            }
            Ok(Handoff::Slot) => self.pool.inner.free_slot(),
            Err(_) => {}
        }
    }
}

/// An instance checked out of the pool.
///
/// Call [`release`](Self::release) when done. Dropping the guard instead
/// schedules the release on the current runtime.
pub struct PooledInstance<F: RendererFactory> {
    id: u64,
    handle: Option<F::Handle>,
    pool: InstancePool<F>,
}

impl<F: RendererFactory> PooledInstance<F> {
    pub(crate) fn new(pool: InstancePool<F>, handle: F::Handle) -> Self {
        Self {
            id: handle.id(),
            handle: Some(handle),
            pool,
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Borrow the underlying handle
    #[must_use]
    pub fn handle(&self) -> Option<&F::Handle> {
        self.handle.as_ref()
    }

    /// Fetch through the checked-out handle
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Option<Vec<Record>>, RendererError> {
        match &self.handle {
            Some(handle) => handle.fetch(request).await,
            None => Err(RendererError::Protocol(format!(
                "instance {} already released",
                self.id
            ))),
        }
    }

    /// Health-check the instance and return it to the pool
    pub async fn release(mut self) {
        if let Some(handle) = self.handle.take() {
            self.pool.release_handle(handle).await;
        }
    }
}

impl<F: RendererFactory> std::fmt::Debug for PooledInstance<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledInstance")
            .field("id", &self.id)
            .field("released", &self.handle.is_none())
            .finish()
    }
}

impl<F: RendererFactory> Drop for PooledInstance<F> {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!(instance = self.id, "Instance dropped without release, releasing in background");
                let pool = self.pool.clone();
                runtime.spawn(async move {
                    pool.release_handle(handle).await;
                });
            }
            Err(_) => {
                warn!(
                    instance = self.id,
                    "Instance dropped outside a runtime, discarding without destroy"
                );
                drop(handle);
                self.pool.inner.free_slot();
            }
        }
    }
}
