//! Console presentation for the headless binary.

use twitch_client::api::Channel;

use crate::index::OnlineOfflineIndex;
use crate::log_buffer::LogBuffer;
use crate::reconciler::Presentation;
use crate::timeline::TimelineEntry;

/// Mirrors the channel lists and on-screen log in memory and reports
/// changes through tracing.
#[derive(Debug, Default)]
pub struct ConsolePresentation {
    online: Vec<String>,
    offline: Vec<String>,
    log: LogBuffer,
    status: String,
    refreshing: bool,
}

impl ConsolePresentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn online(&self) -> &[String] {
        &self.online
    }

    pub fn offline(&self) -> &[String] {
        &self.offline
    }

    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }
}

impl Presentation for ConsolePresentation {
    fn init_channel_display(&mut self, channels: &[Channel]) {
        self.online.clear();
        self.offline = channels.iter().map(Channel::list_label).collect();
        tracing::info!(count = channels.len(), "Watching followed channels");
    }

    fn log_line(&mut self, text: &str) {
        tracing::info!(target: "twitch_notifier::log", "{text}");
        self.log.push(text);
    }

    fn set_refresh_in_progress(&mut self, in_progress: bool) {
        self.refreshing = in_progress;
    }

    fn relayout(&mut self, index: &OnlineOfflineIndex) {
        self.online = index.labels(true).into_iter().map(String::from).collect();
        self.offline = index.labels(false).into_iter().map(String::from).collect();
        tracing::info!(
            online = self.online.len(),
            offline = self.offline.len(),
            "Online: {}",
            self.online.join(", ")
        );
    }

    fn event_logged(&mut self, entry: &TimelineEntry) {
        tracing::info!(channel_id = entry.channel_id, "{}", entry.line());
    }

    fn set_status(&mut self, text: &str) {
        tracing::debug!("{text}");
        self.status = text.to_string();
    }
}
