//! Twitch Kraken REST API client.
//!
//! Every list endpoint used here answers with an object holding a
//! results array and a `_total` count, paged through `limit`/`offset`
//! query parameters. [`PagedFetcher`] walks such endpoints one item at a
//! time; the loaders in [`follows`] and [`streams`] are its two call sites.

mod follows;
mod paged;
mod request;
mod retry;
mod streams;
mod users;

pub mod models;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use follows::{FOLLOWS_RESULTS_KEY, FollowedChannelsLoader};
pub use models::{Channel, ChannelId, FollowEntry, RootResponse, Stream, StreamId, TokenInfo};
pub use paged::{PageCursor, PagedFetcher, PagedQuery};
pub use request::{RawResponse, Transport, endpoint_url};
pub use retry::RetryPolicy;
pub use streams::{LiveStreams, LiveStreamsFetcher, STREAMS_RESULTS_KEY};
pub use users::authenticated_username;

pub const KRAKEN_BASE: &str = "https://api.twitch.tv/kraken";

const ACCEPT_V3: &str = "application/vnd.twitchtv.v3+json";

/// Kraken API client with Client-ID, Accept and OAuth header injection.
pub struct KrakenClient {
    pub(super) http: reqwest::Client,
    pub(super) base_url: String,
    pub(super) client_id: String,
    pub(super) oauth_token: Option<String>,
}
