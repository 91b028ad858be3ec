use super::*;
use crate::TwitchError;

/// Results field of GET /users/:user/follows/channels.
pub const FOLLOWS_RESULTS_KEY: &str = "follows";

impl PagedQuery {
    /// Channels followed by `username`.
    pub fn followed_channels(username: &str, page_size: u64) -> Self {
        PagedQuery::new(
            format!("users/{username}/follows/channels"),
            FOLLOWS_RESULTS_KEY,
            page_size,
        )
    }
}

/// Loads a user's complete follow list.
pub struct FollowedChannelsLoader<'a, T: Transport> {
    transport: &'a T,
    retry: RetryPolicy,
    page_size: u64,
}

impl<'a, T: Transport> FollowedChannelsLoader<'a, T> {
    pub fn new(transport: &'a T, retry: RetryPolicy, page_size: u64) -> Self {
        Self {
            transport,
            retry,
            page_size,
        }
    }

    /// Fetch every follow entry of `username`, in API order.
    ///
    /// Any error after retries aborts the whole load; a partial follow list
    /// is never returned.
    pub async fn load(&self, username: &str) -> Result<Vec<FollowEntry>, TwitchError> {
        let query = PagedQuery::followed_channels(username, self.page_size);
        let mut fetcher = self.retry.open(self.transport, &query).await?;

        let mut follows = Vec::new();
        while fetcher.more() {
            let follow: FollowEntry = self.retry.next(&mut fetcher).await?;
            tracing::trace!(channel = %follow.channel.display_name, "Processing channel follow");
            follows.push(follow);
        }

        tracing::debug!(username, count = follows.len(), "Loaded followed channels");
        Ok(follows)
    }
}
