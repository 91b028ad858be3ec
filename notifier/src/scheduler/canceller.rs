use std::time::Duration;

use super::{CallHandle, DeferredCallScheduler};

type Callback<A, M> = Box<dyn Fn(A) -> M + Send>;

/// Holds back a "cancellable" call for a while so that an "other" event
/// arriving in that window can suppress it.
///
/// Both callbacks turn their arguments into a controller message; the
/// message is what gets delivered.
///
/// - A cancellable event whose predecessor is still held back releases
///   the predecessor right away, then holds back the new one. Consecutive
///   cancellable events never cancel each other.
/// - An other event cancels the held-back call (delivering the optional
///   alternate message for it instead) and is delivered immediately.
pub struct CallbackCanceller<A, M> {
    scheduler: DeferredCallScheduler<M>,
    timeout: Duration,
    cancellable: Callback<A, M>,
    other: Callback<A, M>,
    cancelled_alt: Option<Callback<A, M>>,
    pending: Option<(CallHandle<M>, A)>,
}

impl<A, M> CallbackCanceller<A, M>
where
    A: Clone,
    M: Send + 'static,
{
    pub fn new(
        scheduler: DeferredCallScheduler<M>,
        timeout: Duration,
        cancellable: impl Fn(A) -> M + Send + 'static,
        other: impl Fn(A) -> M + Send + 'static,
    ) -> Self {
        Self {
            scheduler,
            timeout,
            cancellable: Box::new(cancellable),
            other: Box::new(other),
            cancelled_alt: None,
            pending: None,
        }
    }

    /// Message to deliver with the arguments of a call that got cancelled.
    pub fn with_cancelled_callback(mut self, alt: impl Fn(A) -> M + Send + 'static) -> Self {
        self.cancelled_alt = Some(Box::new(alt));
        self
    }

    pub fn on_cancellable_event(&mut self, args: A) {
        if let Some((handle, prev_args)) = self.pending.take() {
            if handle.cancel() {
                self.scheduler.post((self.cancellable)(prev_args));
            }
        }

        let handle = self
            .scheduler
            .schedule(self.timeout, (self.cancellable)(args.clone()));
        self.pending = Some((handle, args));
    }

    pub fn on_other_event(&mut self, args: A) {
        if let Some((handle, prev_args)) = self.pending.take() {
            if handle.cancel() {
                if let Some(alt) = &self.cancelled_alt {
                    self.scheduler.post(alt(prev_args));
                }
            }
        }

        self.scheduler.post((self.other)(args));
    }

    /// Whether a cancellable call is still being held back.
    pub fn has_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|(handle, _)| handle.is_pending())
    }
}
