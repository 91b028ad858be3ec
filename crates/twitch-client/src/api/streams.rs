use std::collections::HashSet;

use super::*;
use crate::TwitchError;

/// Results field of GET /streams/followed.
pub const STREAMS_RESULTS_KEY: &str = "streams";

impl PagedQuery {
    /// Live streams of channels the authenticated user follows.
    pub fn live_followed_streams(page_size: u64) -> Self {
        PagedQuery::new("streams/followed", STREAMS_RESULTS_KEY, page_size)
            .param("stream_type", "live")
    }
}

/// Outcome of one live-streams poll.
///
/// A poll that fails part way keeps the streams seen before the failure.
#[derive(Debug, Default)]
pub struct LiveStreams {
    pub streams: Vec<Stream>,
    pub error: Option<TwitchError>,
}

impl LiveStreams {
    /// Whether every page was read, so absence from `streams` means offline.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Polls which followed channels are currently live.
pub struct LiveStreamsFetcher<'a, T: Transport> {
    transport: &'a T,
    retry: RetryPolicy,
    page_size: u64,
}

impl<'a, T: Transport> LiveStreamsFetcher<'a, T> {
    pub fn new(transport: &'a T, retry: RetryPolicy, page_size: u64) -> Self {
        Self {
            transport,
            retry,
            page_size,
        }
    }

    /// Fetch live streams, keeping only those of channels in `followed`.
    pub async fn fetch(&self, followed: &HashSet<ChannelId>) -> LiveStreams {
        let mut live = LiveStreams::default();
        let query = PagedQuery::live_followed_streams(self.page_size);

        let mut fetcher = match self.retry.open(self.transport, &query).await {
            Ok(fetcher) => fetcher,
            Err(e) => {
                live.error = Some(e);
                return live;
            }
        };

        while fetcher.more() {
            match self.retry.next::<_, Stream>(&mut fetcher).await {
                Ok(stream) if followed.contains(&stream.channel.id) => live.streams.push(stream),
                Ok(stream) => {
                    tracing::debug!(
                        channel = %stream.channel.list_label(),
                        "Skipping channel because it's not a followed channel"
                    );
                }
                Err(e) => {
                    live.error = Some(e);
                    break;
                }
            }
        }

        live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeTransport;

    const PAGE_0: &str =
        "https://api.twitch.tv/kraken/streams/followed?stream_type=live&limit=1&offset=0";
    const PAGE_1: &str =
        "https://api.twitch.tv/kraken/streams/followed?stream_type=live&limit=1&offset=1";

    fn stream_page(channel_id: u64, stream_id: u64, total: u64) -> String {
        serde_json::json!({
            "streams": [{
                "_id": stream_id,
                "channel": {
                    "_id": channel_id,
                    "display_name": format!("Channel{channel_id}"),
                    "url": format!("https://www.twitch.tv/channel{channel_id}"),
                    "status": "somestatus",
                    "logo": null
                },
                "is_playlist": false,
                "created_at": "2016-01-01T01:01:01Z",
                "game": "a vidya game"
            }],
            "_total": total
        })
        .to_string()
    }

    #[tokio::test]
    async fn keeps_only_followed_channels() {
        let transport = FakeTransport::new();
        transport.respond(PAGE_0, 200, &stream_page(1, 10, 2));
        transport.respond(PAGE_1, 200, &stream_page(2, 20, 2));

        let followed = HashSet::from([2]);
        let live = LiveStreamsFetcher::new(&transport, RetryPolicy::default(), 1)
            .fetch(&followed)
            .await;

        assert!(live.is_complete());
        assert_eq!(live.streams.len(), 1);
        assert_eq!(live.streams[0].id, 20);
        assert_eq!(live.streams[0].game.as_deref(), Some("a vidya game"));
    }

    #[tokio::test]
    async fn failure_mid_poll_keeps_partial_results() {
        let transport = FakeTransport::new();
        transport.respond(PAGE_0, 200, &stream_page(1, 10, 2));
        transport.respond(PAGE_1, 503, "");

        let followed = HashSet::from([1, 2]);
        let live = LiveStreamsFetcher::new(&transport, RetryPolicy::new(2), 1)
            .fetch(&followed)
            .await;

        assert!(!live.is_complete());
        assert_eq!(live.streams.len(), 1);
        assert_eq!(live.error.and_then(|e| e.status()), Some(503));
        assert_eq!(transport.request_count(PAGE_1), 2);
    }

    #[tokio::test]
    async fn failure_on_first_page_has_no_streams() {
        let transport = FakeTransport::new();
        transport.respond(PAGE_0, 500, "");

        let live = LiveStreamsFetcher::new(&transport, RetryPolicy::new(1), 1)
            .fetch(&HashSet::from([1]))
            .await;
        assert!(live.streams.is_empty());
        assert!(!live.is_complete());
    }
}
