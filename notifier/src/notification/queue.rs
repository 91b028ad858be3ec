//! Single-flight notification queue.
//!
//! Notifications are shown one at a time through a [`NotificationSink`].
//! When the sink reports a click or a timeout, the next notification is
//! shown after a short pause. Every step runs on the controller: sink
//! replies and the pause come back as [`DispatcherEvent`] messages.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::scheduler::DeferredCallScheduler;

use super::types::{ClickCallback, NotificationEntry};

/// Pause between one notification finishing and the next being shown.
pub const NOTIFICATION_PACING: Duration = Duration::from_millis(250);

/// Controller messages that drive the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherEvent {
    Clicked { token: u64 },
    TimedOut { token: u64 },
    DispenseNext,
}

/// Displays notifications, e.g. as desktop popups.
pub trait NotificationSink: Send {
    /// Show a notification and later answer through `reply`, exactly once.
    fn show(&mut self, title: &str, body: &str, url: &str, reply: NotificationReply);
}

/// How a sink reports the outcome of a shown notification.
#[derive(Clone)]
pub struct NotificationReply {
    token: u64,
    post: Arc<dyn Fn(DispatcherEvent) + Send + Sync>,
}

impl NotificationReply {
    pub fn clicked(&self) {
        (self.post)(DispatcherEvent::Clicked { token: self.token });
    }

    pub fn timed_out(&self) {
        (self.post)(DispatcherEvent::TimedOut { token: self.token });
    }
}

impl std::fmt::Debug for NotificationReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationReply")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

struct Showing {
    token: u64,
    on_click: ClickCallback,
}

pub struct NotificationDispatcher<S, M> {
    sink: S,
    scheduler: DeferredCallScheduler<M>,
    queue: VecDeque<NotificationEntry>,
    in_progress: bool,
    showing: Option<Showing>,
    next_token: u64,
}

impl<S, M> NotificationDispatcher<S, M>
where
    S: NotificationSink,
    M: From<DispatcherEvent> + Send + 'static,
{
    pub fn new(sink: S, scheduler: DeferredCallScheduler<M>) -> Self {
        Self {
            sink,
            scheduler,
            queue: VecDeque::new(),
            in_progress: false,
            showing: None,
            next_token: 1,
        }
    }

    /// Queue a notification, showing it right away if nothing is in flight.
    pub fn enqueue(&mut self, entry: NotificationEntry) {
        self.queue.push_back(entry);
        if !self.in_progress {
            self.dispense_next();
        }
    }

    pub fn handle(&mut self, event: DispatcherEvent) {
        match event {
            DispatcherEvent::Clicked { token } => {
                let Some(showing) = self.take_showing(token) else {
                    return;
                };
                tracing::info!("Notification clicked");
                if let Err(e) = (showing.on_click)() {
                    tracing::warn!("Notification click callback returned error: {e:#}");
                }
                self.finished();
            }
            DispatcherEvent::TimedOut { token } => {
                if self.take_showing(token).is_none() {
                    return;
                }
                tracing::debug!("Notification timeout");
                self.finished();
            }
            DispatcherEvent::DispenseNext => self.dispense_next(),
        }
    }

    /// Drop everything queued and stop dispensing.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.showing = None;
        self.in_progress = false;
    }

    pub fn is_idle(&self) -> bool {
        !self.in_progress
    }

    /// Whether a notification is currently on screen.
    pub fn is_showing(&self) -> bool {
        self.showing.is_some()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The showing entry, if `token` is the one it was shown with.
    ///
    /// Sinks may report twice; only the first report counts.
    fn take_showing(&mut self, token: u64) -> Option<Showing> {
        match &self.showing {
            Some(showing) if showing.token == token => self.showing.take(),
            _ => {
                tracing::debug!(token, "Ignoring reply for a notification no longer showing");
                None
            }
        }
    }

    fn finished(&mut self) {
        if self.in_progress {
            self.scheduler
                .schedule(NOTIFICATION_PACING, M::from(DispatcherEvent::DispenseNext));
        }
    }

    fn dispense_next(&mut self) {
        let Some(entry) = self.queue.pop_front() else {
            self.in_progress = false;
            return;
        };
        self.in_progress = true;

        let token = self.next_token;
        self.next_token += 1;
        self.showing = Some(Showing {
            token,
            on_click: entry.on_click,
        });

        let scheduler = self.scheduler.clone();
        let reply = NotificationReply {
            token,
            post: Arc::new(move |event| {
                scheduler.post(M::from(event));
            }),
        };

        tracing::info!(body = %entry.body, "Showing notification");
        self.sink.show(&entry.title, &entry.body, &entry.url, reply);
    }
}
