//! Poll/reload cycle that keeps the online/offline view in sync with the API.
//!
//! Each call to [`StateReconciler::run_cycle`] optionally reloads the
//! followed channel list, then polls which of those channels are live and
//! diffs that against the channels currently shown online. The caller is
//! told how long to wait before the next cycle and which notifications to
//! show.

mod poll;
mod reload;

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use twitch_client::TwitchError;
use twitch_client::api::{Channel, ChannelId, RetryPolicy, Stream, StreamId, Transport};

use crate::config::AppConfig;
use crate::index::OnlineOfflineIndex;
use crate::notification::NotificationEntry;
use crate::timeline::{EventTimeline, TimelineEntry};

/// Polls are never closer together than this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(60);
/// Follow list reloads are never closer together than this.
pub const MIN_RELOAD_INTERVAL: Duration = Duration::from_secs(60);
/// Wait before retrying a failed follow list reload.
pub const FOLLOWS_RETRY_WAIT: Duration = Duration::from_secs(10);
/// Consecutive follow list failures tolerated before giving up.
pub const MAX_FOLLOWS_RETRIES: u32 = 10;

/// Display capabilities the reconciler drives.
pub trait Presentation: Send {
    /// Show `channels` (already sorted) as the new, all-offline channel list.
    fn init_channel_display(&mut self, channels: &[Channel]);

    /// Append a line to the on-screen log.
    fn log_line(&mut self, text: &str);

    fn set_refresh_in_progress(&mut self, in_progress: bool);

    /// Channels moved between the online and offline lists.
    fn relayout(&mut self, _index: &OnlineOfflineIndex) {}

    /// A stream event was added to (or replaced in) the timeline.
    fn event_logged(&mut self, _entry: &TimelineEntry) {}

    fn set_status(&mut self, _text: &str) {}
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Could not load the followed channels list after {failures} attempts: {source}")]
    FollowsUnavailable {
        failures: u32,
        #[source]
        source: TwitchError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NeedsReload,
    Polling,
}

/// Reconciler tuning, usually taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    /// Whose follows to watch; resolved from the token when `None`.
    pub username: Option<String>,
    pub poll_interval: Duration,
    pub reload_interval: Duration,
    /// Notify for every followed channel regardless of its per-follow flag.
    pub watch_all: bool,
    pub http_tries: u32,
    pub page_size: u64,
    pub popups: bool,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ReconcilerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            username: config.username.clone(),
            poll_interval: config.poll_interval,
            reload_interval: config.reload_interval,
            watch_all: config.watch_all,
            http_tries: config.http_retries,
            page_size: config.page_size,
            popups: !config.no_popups,
        }
    }
}

/// Result of one cycle.
#[derive(Debug)]
pub struct Cycle {
    pub wait: Duration,
    pub reason: String,
    /// Notifications to show, in the order the streams were seen.
    pub notifications: Vec<NotificationEntry>,
}

impl Cycle {
    fn wait(wait: Duration, reason: impl Into<String>) -> Self {
        Self {
            wait,
            reason: reason.into(),
            notifications: Vec::new(),
        }
    }
}

/// A channel from the follow list.
#[derive(Debug, Clone)]
struct FollowedChannel {
    channel: Channel,
    /// Per-follow notification flag as reported by the API.
    notifications: bool,
}

/// What an entry of the channel lists resolves to.
#[derive(Debug, Clone, Copy)]
pub struct ListEntryRef<'a> {
    pub channel: &'a Channel,
    pub stream: Option<&'a Stream>,
    pub url: &'a str,
}

pub struct StateReconciler<T: Transport, P: Presentation> {
    transport: T,
    presentation: P,
    settings: ReconcilerSettings,
    retry: RetryPolicy,
    phase: Phase,
    username: Option<String>,
    last_reload: Option<Instant>,
    follows_failures: u32,
    followed: HashMap<ChannelId, FollowedChannel>,
    index: OnlineOfflineIndex,
    timeline: EventTimeline,
    streams: HashMap<ChannelId, Stream>,
    last_notified: HashMap<ChannelId, StreamId>,
    needs_relayout: bool,
}

impl<T: Transport, P: Presentation> StateReconciler<T, P> {
    pub fn new(transport: T, presentation: P, settings: ReconcilerSettings) -> Self {
        let retry = RetryPolicy::new(settings.http_tries);
        let username = settings.username.clone();
        Self {
            transport,
            presentation,
            settings,
            retry,
            phase: Phase::NeedsReload,
            username,
            last_reload: None,
            follows_failures: 0,
            followed: HashMap::new(),
            index: OnlineOfflineIndex::default(),
            timeline: EventTimeline::new(),
            streams: HashMap::new(),
            last_notified: HashMap::new(),
            needs_relayout: false,
        }
    }

    /// Run one cycle: reload the follow list if due, then poll live streams.
    ///
    /// A failed reload ends the cycle early with a short retry wait. Only
    /// running out of reload attempts is an error.
    pub async fn run_cycle(&mut self) -> Result<Cycle, ReconcileError> {
        if self.reload_due() {
            self.phase = Phase::NeedsReload;
        }
        if self.phase == Phase::NeedsReload {
            if let Some(retry) = self.reload().await? {
                return Ok(retry);
            }
        }
        Ok(self.poll().await)
    }

    /// Reload the follow list at the start of the next cycle.
    pub fn request_reload(&mut self) {
        tracing::info!("Channel list reload requested");
        self.phase = Phase::NeedsReload;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Login name whose follows are watched, once known.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn index(&self) -> &OnlineOfflineIndex {
        &self.index
    }

    pub fn timeline(&self) -> &EventTimeline {
        &self.timeline
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    /// Stream id a notification was last shown for.
    pub fn last_notified(&self, channel_id: ChannelId) -> Option<StreamId> {
        self.last_notified.get(&channel_id).copied()
    }

    pub fn channel(&self, channel_id: ChannelId) -> Option<&Channel> {
        self.followed.get(&channel_id).map(|f| &f.channel)
    }

    /// Resolve position `index` of the online or offline list.
    ///
    /// The url is the live stream's channel page when the channel is
    /// live, the channel page from the follow list otherwise.
    pub fn entry_at(&self, online: bool, index: usize) -> Option<ListEntryRef<'_>> {
        let channel_id = self.index.channel_at(online, index)?;
        self.entry_for(channel_id)
    }

    /// Resolve the `row`-th timeline event, newest first.
    pub fn timeline_entry_at(&self, row: usize) -> Option<ListEntryRef<'_>> {
        let channel_id = self.timeline.channel_for_row(row)?;
        self.entry_for(channel_id)
    }

    fn entry_for(&self, channel_id: ChannelId) -> Option<ListEntryRef<'_>> {
        let channel = &self.followed.get(&channel_id)?.channel;
        let stream = self.streams.get(&channel_id);
        let url = stream.map_or(channel.url.as_str(), |s| s.channel.url.as_str());
        Some(ListEntryRef {
            channel,
            stream,
            url,
        })
    }

    fn reload_due(&self) -> bool {
        let interval = self.settings.reload_interval.max(MIN_RELOAD_INTERVAL);
        self.last_reload.is_none_or(|last| last.elapsed() >= interval)
    }
}

#[cfg(test)]
mod tests;
