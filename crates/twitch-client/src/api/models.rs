use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ChannelId = u64;
pub type StreamId = u64;

/// Broadcaster info as embedded in follow and stream objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(rename = "_id", alias = "id")]
    pub id: ChannelId,
    pub display_name: String,
    pub url: String,
    #[serde(default)]
    pub status: Option<String>,
    /// URL of the channel logo, if any.
    #[serde(default)]
    pub logo: Option<String>,
}

impl Channel {
    /// Line shown in the online/offline lists, e.g. `FakeChannel (123)`.
    pub fn list_label(&self) -> String {
        format!("{} ({})", self.display_name, self.id)
    }
}

/// A live video session happening on a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    #[serde(rename = "_id", alias = "id")]
    pub id: StreamId,
    pub channel: Channel,
    /// Rebroadcasts are reported as streams but are not live.
    #[serde(default)]
    pub is_playlist: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub game: Option<String>,
}

/// Entry from GET /users/:user/follows/channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowEntry {
    pub channel: Channel,
    /// Whether the user asked for notifications from this channel.
    #[serde(default)]
    pub notifications: bool,
}

/// Response of the API root, used to resolve the authenticated user.
#[derive(Debug, Default, Deserialize)]
pub struct RootResponse {
    #[serde(default)]
    pub token: TokenInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub user_name: Option<String>,
}
