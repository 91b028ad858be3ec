//! Deferred calls delivered to a single controller run loop.
//!
//! Timers run as background tasks. When one fires it does not run
//! anything itself: it posts its message into the [`Mailbox`], which the
//! controller drains one message at a time. All state owned by the
//! controller is therefore only ever touched from the controller task.

mod canceller;

pub use canceller::CallbackCanceller;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Identifier of a scheduled call. Never reused within one scheduler.
pub type CallId = u64;

/// Create a connected scheduler and mailbox.
pub fn channel<M: Send + 'static>() -> (DeferredCallScheduler<M>, Mailbox<M>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();
    let scheduler = DeferredCallScheduler {
        inner: Arc::new(Inner {
            tx,
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
            shutdown: shutdown.clone(),
        }),
    };
    (scheduler, Mailbox { rx, shutdown })
}

struct Inner<M> {
    tx: mpsc::UnboundedSender<M>,
    next_id: AtomicU64,
    pending: Mutex<HashMap<CallId, JoinHandle<()>>>,
    closed: AtomicBool,
    shutdown: CancellationToken,
}

impl<M> Inner<M> {
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<CallId, JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn send(&self, message: M) -> bool {
        if self.is_closed() {
            return false;
        }
        if self.tx.send(message).is_err() {
            tracing::debug!("Mailbox dropped, discarding message");
            return false;
        }
        true
    }

    /// Timer expiry: deliver only if the call is still pending.
    fn fire(&self, id: CallId, message: M) {
        let still_pending = self.lock_pending().remove(&id).is_some();
        if still_pending {
            self.send(message);
        }
    }
}

/// Thread-safe handle for posting messages to the controller, now or later.
pub struct DeferredCallScheduler<M> {
    inner: Arc<Inner<M>>,
}

impl<M> Clone for DeferredCallScheduler<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Send + 'static> DeferredCallScheduler<M> {
    /// Deliver `message` to the mailbox once `delay` has elapsed.
    pub fn schedule(&self, delay: Duration, message: M) -> CallHandle<M> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if self.inner.is_closed() {
            tracing::debug!(id, "Scheduler shut down, not arming call");
            return CallHandle {
                id,
                scheduler: self.clone(),
            };
        }

        // Hold the lock while spawning so the timer cannot fire before it is
        // registered as pending.
        let mut pending = self.inner.lock_pending();
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            sleep(delay).await;
            inner.fire(id, message);
        });
        pending.insert(id, task);
        drop(pending);

        CallHandle {
            id,
            scheduler: self.clone(),
        }
    }

    /// Deliver `message` to the mailbox right away.
    ///
    /// Returns false if the scheduler is shut down.
    pub fn post(&self, message: M) -> bool {
        self.inner.send(message)
    }

    /// Disarm a pending call.
    ///
    /// Returns true if the call had not fired yet and will now never be
    /// delivered. A call whose message is already in the mailbox cannot be
    /// retracted and returns false.
    pub fn cancel(&self, id: CallId) -> bool {
        match self.inner.lock_pending().remove(&id) {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending call and stop delivering messages, including
    /// ones already posted but not yet received.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let tasks: Vec<_> = self.inner.lock_pending().drain().collect();
        tracing::debug!(count = tasks.len(), "Stopping all timers");
        for (_, task) in tasks {
            task.abort();
        }
        self.inner.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.is_closed()
    }

    /// Number of armed calls that have not fired.
    pub fn pending_count(&self) -> usize {
        self.inner.lock_pending().len()
    }
}

/// Handle to one scheduled call.
pub struct CallHandle<M> {
    id: CallId,
    scheduler: DeferredCallScheduler<M>,
}

impl<M: Send + 'static> CallHandle<M> {
    pub fn id(&self) -> CallId {
        self.id
    }

    /// See [`DeferredCallScheduler::cancel`].
    pub fn cancel(&self) -> bool {
        self.scheduler.cancel(self.id)
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.inner.lock_pending().contains_key(&self.id)
    }
}

impl<M> std::fmt::Debug for CallHandle<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallHandle").field("id", &self.id).finish()
    }
}

/// Receiving end, owned by the controller run loop.
pub struct Mailbox<M> {
    rx: mpsc::UnboundedReceiver<M>,
    shutdown: CancellationToken,
}

impl<M> Mailbox<M> {
    /// Wait for the next message. `None` once the scheduler is shut down.
    pub async fn recv(&mut self) -> Option<M> {
        if self.shutdown.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => None,
            message = self.rx.recv() => message,
        }
    }

    /// Take a message that is already waiting, without blocking.
    pub fn try_recv(&mut self) -> Option<M> {
        if self.shutdown.is_cancelled() {
            return None;
        }
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests;
