//! Time-ordered log of channel online/offline events.

use chrono::{DateTime, Local, SubsecRound, Utc};
use twitch_client::api::ChannelId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub time: DateTime<Utc>,
    pub channel_id: ChannelId,
    pub message: String,
}

impl TimelineEntry {
    /// Display line, in local time.
    pub fn line(&self) -> String {
        format!(
            "{}: {}",
            self.time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

/// What [`EventTimeline::insert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Added(usize),
    Replaced(usize),
}

impl Insertion {
    /// Index of the entry in [`EventTimeline::entries`].
    pub fn position(self) -> usize {
        match self {
            Self::Added(i) | Self::Replaced(i) => i,
        }
    }
}

/// Events in ascending time order, at most one per (time, channel).
#[derive(Debug, Default)]
pub struct EventTimeline {
    entries: Vec<TimelineEntry>,
}

impl EventTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event. Times are kept to whole seconds.
    ///
    /// An event for a channel that already has one at the same second
    /// replaces it in place.
    pub fn insert(
        &mut self,
        channel_id: ChannelId,
        time: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Insertion {
        let time = time.round_subsecs(0);
        let message = message.into();
        let position = self.entries.partition_point(|e| e.time < time);

        let same_second = self.entries[position..]
            .iter()
            .take_while(|e| e.time == time)
            .position(|e| e.channel_id == channel_id);
        if let Some(offset) = same_second {
            let existing = &mut self.entries[position + offset];
            tracing::debug!(channel_id, %time, "Replacing existing timeline entry");
            existing.message = message;
            return Insertion::Replaced(position + offset);
        }

        self.entries.insert(
            position,
            TimelineEntry {
                time,
                channel_id,
                message,
            },
        );
        Insertion::Added(position)
    }

    /// Oldest first.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Newest first, the order the event log is shown in.
    pub fn newest_first(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter().rev()
    }

    /// Channel of the `row`-th event counted from the newest.
    pub fn channel_for_row(&self, row: usize) -> Option<ChannelId> {
        self.newest_first().nth(row).map(|e| e.channel_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
