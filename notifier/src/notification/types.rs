//! Notification type definitions.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use twitch_client::api::Stream;

/// Title of every stream notification.
pub const NOTIFICATION_TITLE: &str = "twitch-notifier";

/// Runs when a notification is clicked.
pub type ClickCallback = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// A notification waiting to be shown.
pub struct NotificationEntry {
    pub title: String,
    pub body: String,
    pub url: String,
    pub on_click: ClickCallback,
}

impl NotificationEntry {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        url: impl Into<String>,
        on_click: ClickCallback,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            url: url.into(),
            on_click,
        }
    }

    /// "Channel went live" notification; clicking opens the stream page.
    pub fn stream_live(channel_name: &str, stream: &Stream, now: DateTime<Utc>) -> Self {
        let url = stream.channel.url.clone();
        let target = url.clone();
        Self::new(
            NOTIFICATION_TITLE,
            live_message(channel_name, stream, now),
            url,
            Box::new(move || {
                webbrowser::open(&target)?;
                Ok(())
            }),
        )
    }
}

impl std::fmt::Debug for NotificationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationEntry")
            .field("title", &self.title)
            .field("body", &self.body)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// `"<name> is now live with <game> (up <elapsed>)"`.
pub fn live_message(channel_name: &str, stream: &Stream, now: DateTime<Utc>) -> String {
    let elapsed = now.round_subsecs(0) - stream.created_at.round_subsecs(0);
    let show_info = stream
        .game
        .as_deref()
        .map(|game| format!("with {game} "))
        .unwrap_or_default();
    format!(
        "{channel_name} is now live {show_info}(up {})",
        time_desc(elapsed)
    )
}

/// Elapsed time as `"<h> h <mm> m"` from one hour on, else `"<m> min"`.
pub fn time_desc(elapsed: TimeDelta) -> String {
    let elapsed = elapsed.max(TimeDelta::zero());
    if elapsed.num_hours() >= 1 {
        format!(
            "{} h {:02} m",
            elapsed.num_hours(),
            elapsed.num_minutes() % 60
        )
    } else {
        format!("{} min", elapsed.num_minutes())
    }
}
