use std::collections::HashSet;

use chrono::{DateTime, Local, Utc};
use twitch_client::api::LiveStreamsFetcher;

use super::*;

impl<T: Transport, P: Presentation> StateReconciler<T, P> {
    /// Fetch live streams and apply every online/offline transition.
    pub(super) async fn poll(&mut self) -> Cycle {
        let followed: HashSet<ChannelId> = self.followed.keys().copied().collect();
        let live = LiveStreamsFetcher::new(&self.transport, self.retry, self.settings.page_size)
            .fetch(&followed)
            .await;

        // Channels online now and absent from a complete poll went offline.
        // After a failed poll absence proves nothing.
        let mut previously_online: HashSet<ChannelId> = match &live.error {
            None => self.index.online_ids().collect(),
            Some(e) => {
                tracing::warn!("Live streams request failed: {e}");
                self.presentation
                    .log_line(&format!("Error during update streams follows request: {e}"));
                self.presentation.log_line(
                    "Processing any partial update and waiting until the next request time",
                );
                HashSet::new()
            }
        };

        let now = Utc::now();
        let mut notifications = Vec::new();
        for stream in live.streams {
            let channel_id = stream.channel.id;
            previously_online.remove(&channel_id);

            if let Some(followed) = self.followed.get_mut(&channel_id) {
                followed.channel = stream.channel.clone();
            }

            if stream.is_playlist {
                self.presentation
                    .log_line(&format!("channel_id {channel_id} is a playlist stream"));
                self.went_offline(channel_id, now);
                continue;
            }

            if let Some(entry) = self.check_notify(&stream, now) {
                notifications.push(entry);
            }
            self.apply_transition(channel_id, true, Some(&stream), now);
            self.streams.insert(channel_id, stream);
        }

        for channel_id in previously_online {
            tracing::debug!(channel_id, "Stream no longer listed, assuming offline");
            self.went_offline(channel_id, now);
        }

        if self.needs_relayout {
            self.presentation.relayout(&self.index);
            self.needs_relayout = false;
        }
        if live.error.is_none() {
            self.presentation.set_status(&format!(
                "Last poll {}",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ));
        }

        let wait = self.settings.poll_interval.max(MIN_POLL_INTERVAL);
        Cycle {
            wait,
            reason: format!("Waiting {} s for next poll", wait.as_secs()),
            notifications,
        }
    }

    /// Record `stream` as the channel's notified session and return the
    /// notification to show, unless this session was already notified.
    fn check_notify(&mut self, stream: &Stream, now: DateTime<Utc>) -> Option<NotificationEntry> {
        let channel_id = stream.channel.id;
        let followed = self.followed.get(&channel_id)?;
        let previous = self.last_notified.insert(channel_id, stream.id);
        if previous == Some(stream.id) {
            return None;
        }

        if !(self.settings.watch_all || followed.notifications) {
            return None;
        }
        if !self.settings.popups {
            tracing::debug!(channel_id, "Popups disabled, not notifying");
            return None;
        }

        tracing::info!(
            channel = %followed.channel.display_name,
            stream_id = stream.id,
            "Stream went live"
        );
        Some(NotificationEntry::stream_live(
            &followed.channel.display_name,
            stream,
            now,
        ))
    }

    fn went_offline(&mut self, channel_id: ChannelId, now: DateTime<Utc>) {
        self.last_notified.remove(&channel_id);
        self.streams.remove(&channel_id);
        self.apply_transition(channel_id, false, None, now);
    }

    /// Move a channel between the lists if its online state changed, and
    /// log the change in the timeline.
    ///
    /// Online events are dated at the stream start, offline events now.
    fn apply_transition(
        &mut self,
        channel_id: ChannelId,
        online: bool,
        stream: Option<&Stream>,
        now: DateTime<Utc>,
    ) {
        let Some(followed) = self.followed.get(&channel_id) else {
            tracing::debug!(channel_id, "Skipping state change for a channel not followed");
            return;
        };
        if !self.index.move_channel(channel_id, online) {
            return;
        }
        self.needs_relayout = true;

        let name = &followed.channel.display_name;
        let (time, message) = match stream {
            Some(stream) if online => (stream.created_at, online_event_message(name, stream)),
            _ => (now, format!("{name} is now offline")),
        };
        let position = self.timeline.insert(channel_id, time, message).position();
        self.presentation
            .event_logged(&self.timeline.entries()[position]);
    }
}

fn online_event_message(name: &str, stream: &Stream) -> String {
    match stream.game.as_deref() {
        Some(game) => format!("{name} is now live ({game})"),
        None => format!("{name} is now live"),
    }
}
