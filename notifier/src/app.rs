//! Controller: the single task that owns all application state.
//!
//! Every event is handled to completion before the next one is taken from
//! the mailbox, so the reconciler, the channel lists, and the notification
//! queue never see concurrent access.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use twitch_client::api::{Channel, Stream, Transport};

use crate::assets::{LogoFetched, LogoFetcher, LogoLoader};
use crate::events::{AppEvent, ListPosition};
use crate::notification::{NotificationDispatcher, NotificationSink};
use crate::reconciler::{Presentation, ReconcileError, StateReconciler};
use crate::scheduler::{self, CallHandle, CallbackCanceller, DeferredCallScheduler, Mailbox};

/// How long a selection waits before its info is shown, giving an
/// activation of the same entry the chance to cancel it.
pub const SELECTION_DELAY: Duration = Duration::from_millis(300);

/// Opens a URL, normally in the default browser.
pub type UrlOpener = Arc<dyn Fn(&str) -> anyhow::Result<()> + Send + Sync>;

pub fn open_in_browser(url: &str) -> anyhow::Result<()> {
    webbrowser::open(url)?;
    Ok(())
}

pub struct Controller<T, P, S, F>
where
    T: Transport,
    P: Presentation,
{
    reconciler: StateReconciler<T, P>,
    dispatcher: NotificationDispatcher<S, AppEvent>,
    logos: LogoLoader<F, AppEvent>,
    selection: CallbackCanceller<ListPosition, AppEvent>,
    scheduler: DeferredCallScheduler<AppEvent>,
    mailbox: Mailbox<AppEvent>,
    poll_timer: Option<CallHandle<AppEvent>>,
    open_url: UrlOpener,
}

impl<T, P, S, F> Controller<T, P, S, F>
where
    T: Transport + Send,
    P: Presentation,
    S: NotificationSink,
    F: LogoFetcher,
{
    pub fn new(reconciler: StateReconciler<T, P>, sink: S, logo_fetcher: F) -> Self {
        let (scheduler, mailbox) = scheduler::channel();
        let selection = CallbackCanceller::new(
            scheduler.clone(),
            SELECTION_DELAY,
            AppEvent::ShowChannelInfo,
            AppEvent::OpenChannel,
        );
        Self {
            reconciler,
            dispatcher: NotificationDispatcher::new(sink, scheduler.clone()),
            logos: LogoLoader::new(logo_fetcher, scheduler.clone()),
            selection,
            scheduler,
            mailbox,
            poll_timer: None,
            open_url: Arc::new(open_in_browser),
        }
    }

    /// Replace how channel pages are opened, from the lists, the timeline,
    /// and notification clicks alike.
    pub fn with_url_opener(
        mut self,
        open_url: impl Fn(&str) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.open_url = Arc::new(open_url);
        self
    }

    /// Handle for posting events from other tasks.
    pub fn scheduler(&self) -> DeferredCallScheduler<AppEvent> {
        self.scheduler.clone()
    }

    pub fn reconciler(&self) -> &StateReconciler<T, P> {
        &self.reconciler
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher<S, AppEvent> {
        &self.dispatcher
    }

    /// Poll right away, then handle events until shut down.
    ///
    /// Only running out of follow list reload attempts ends the loop with
    /// an error.
    pub async fn run(&mut self) -> Result<(), ReconcileError> {
        tracing::info!("Controller started");
        self.scheduler.post(AppEvent::Poll);

        while let Some(event) = self.mailbox.recv().await {
            if self.handle(event).await?.is_break() {
                break;
            }
        }

        tracing::info!("Controller stopped");
        Ok(())
    }

    /// Take the next event from the mailbox and handle it.
    ///
    /// Returns `None` once the mailbox is shut down.
    pub async fn step(&mut self) -> Option<Result<ControlFlow<()>, ReconcileError>> {
        let event = self.mailbox.recv().await?;
        Some(self.handle(event).await)
    }

    pub async fn handle(&mut self, event: AppEvent) -> Result<ControlFlow<()>, ReconcileError> {
        tracing::trace!(?event, "Handling event");
        match event {
            AppEvent::Poll => self.poll().await?,
            AppEvent::ReloadChannels => self.reload_now(),
            AppEvent::Dispatcher(event) => self.dispatcher.handle(event),
            AppEvent::SelectChannel(position) => self.selection.on_cancellable_event(position),
            AppEvent::ActivateChannel(position) => self.selection.on_other_event(position),
            AppEvent::ShowChannelInfo(position) => self.show_info(position),
            AppEvent::OpenChannel(position) => {
                let url = self
                    .reconciler
                    .entry_at(position.online, position.index)
                    .map(|entry| entry.url.to_string());
                self.open(url, || format!("No channel at {position:?}"));
            }
            AppEvent::OpenTimelineEntry(row) => {
                let url = self
                    .reconciler
                    .timeline_entry_at(row)
                    .map(|entry| entry.url.to_string());
                self.open(url, || format!("No stream event at row {row}"));
            }
            AppEvent::ListChannels => self.list_channels(),
            AppEvent::LogoLoaded(fetched) => self.logo_loaded(fetched),
            AppEvent::Shutdown => {
                tracing::info!("Shutdown requested");
                self.dispatcher.clear();
                self.logos.cancel_all();
                self.scheduler.shutdown();
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn poll(&mut self) -> Result<(), ReconcileError> {
        self.poll_timer = None;
        let cycle = self.reconciler.run_cycle().await?;

        for mut notification in cycle.notifications {
            let open = Arc::clone(&self.open_url);
            let url = notification.url.clone();
            notification.on_click = Box::new(move || open(&url));
            self.dispatcher.enqueue(notification);
        }

        tracing::info!("{}", cycle.reason);
        self.poll_timer = Some(self.scheduler.schedule(cycle.wait, AppEvent::Poll));
        Ok(())
    }

    /// Reload the channel list, cutting short the wait for the next poll.
    fn reload_now(&mut self) {
        self.reconciler.request_reload();
        self.reconciler.presentation_mut().set_refresh_in_progress(true);

        if let Some(timer) = self.poll_timer.take() {
            if timer.cancel() {
                tracing::debug!("Cancelled poll wait, polling now");
                self.scheduler.post(AppEvent::Poll);
            }
        }
    }

    fn show_info(&mut self, position: ListPosition) {
        let Some(entry) = self.reconciler.entry_at(position.online, position.index) else {
            tracing::debug!(?position, "Selection no longer points at a channel");
            return;
        };
        let channel = entry.channel.clone();
        let line = channel_info_line(entry.channel, entry.stream);

        let presentation = self.reconciler.presentation_mut();
        presentation.log_line(&line);

        match channel.logo.as_deref().filter(|url| !url.is_empty()) {
            Some(logo) => {
                presentation.log_line(&format!("Showing logo {logo}"));
                self.logos.request(channel.id, logo);
            }
            None => self.logos.cancel_all(),
        }
    }

    fn logo_loaded(&mut self, fetched: LogoFetched) {
        if !self.logos.is_current(&fetched) {
            tracing::debug!(url = %fetched.url, "Dropping stale logo");
            return;
        }
        let presentation = self.reconciler.presentation_mut();
        match fetched.image {
            Ok(bytes) => {
                tracing::debug!(
                    channel_id = fetched.channel_id,
                    bytes = bytes.len(),
                    "Logo loaded"
                );
                presentation.log_line("Logo loaded");
            }
            Err(e) => presentation.log_line(&e),
        }
    }

    fn open(&mut self, url: Option<String>, missing: impl FnOnce() -> String) {
        let Some(url) = url else {
            tracing::debug!("{}", missing());
            return;
        };
        tracing::info!(%url, "Opening channel page");
        if let Err(e) = (self.open_url)(&url) {
            tracing::warn!("Failed to open {url}: {e:#}");
        }
    }

    fn list_channels(&mut self) {
        let index = self.reconciler.index();
        let online = index.labels(true).join(", ");
        let offline = index.labels(false).join(", ");
        let events: Vec<String> = self
            .reconciler
            .timeline()
            .newest_first()
            .take(10)
            .map(|e| e.line())
            .collect();

        let presentation = self.reconciler.presentation_mut();
        presentation.log_line(&format!("Online: {online}"));
        presentation.log_line(&format!("Offline: {offline}"));
        for line in events {
            presentation.log_line(&line);
        }
    }
}

/// One-line summary of a channel and its live stream, if any.
fn channel_info_line(channel: &Channel, stream: Option<&Stream>) -> String {
    let status = channel.status.as_deref().unwrap_or("");
    match stream {
        Some(stream) => {
            let game = stream.game.as_deref().unwrap_or("unknown game");
            format!(
                "{}: {status} [{game}, live since {}]",
                channel.display_name,
                stream
                    .created_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
            )
        }
        None => format!("{}: {status} [offline]", channel.display_name),
    }
}
