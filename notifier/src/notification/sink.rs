//! Headless notification display.

use std::time::Duration;

use super::queue::{NotificationReply, NotificationSink};

/// Prints notifications to the log and times each one out after the
/// configured display duration. Nothing can be clicked.
#[derive(Debug, Clone)]
pub struct LogSink {
    display_for: Duration,
}

impl LogSink {
    pub fn new(display_for: Duration) -> Self {
        Self { display_for }
    }
}

impl NotificationSink for LogSink {
    fn show(&mut self, title: &str, body: &str, url: &str, reply: NotificationReply) {
        tracing::info!(title, url, "{body}");
        let display_for = self.display_for;
        tokio::spawn(async move {
            tokio::time::sleep(display_for).await;
            reply.timed_out();
        });
    }
}
