use twitch_client::api::{FollowEntry, FollowedChannelsLoader, authenticated_username};

use super::*;

impl<T: Transport, P: Presentation> StateReconciler<T, P> {
    /// Replace the followed channel set with a fresh follow list.
    ///
    /// Returns the cycle to end with when the load failed and should be
    /// retried shortly.
    pub(super) async fn reload(&mut self) -> Result<Option<Cycle>, ReconcileError> {
        tracing::info!("Reloading followed channels");
        self.presentation.set_refresh_in_progress(true);

        match self.load_follows().await {
            Ok(follows) => {
                self.apply_follows(follows);
                Ok(None)
            }
            Err(e) => self.follows_failed(e).map(Some),
        }
    }

    async fn load_follows(&mut self) -> Result<Vec<FollowEntry>, TwitchError> {
        let username = match &self.username {
            Some(name) => name.clone(),
            None => {
                let Some(name) = authenticated_username(&self.transport).await? else {
                    panic!("got empty username from root request");
                };
                tracing::info!(username = %name, "Resolved authenticated user");
                self.username = Some(name.clone());
                name
            }
        };

        FollowedChannelsLoader::new(&self.transport, self.retry, self.settings.page_size)
            .load(&username)
            .await
    }

    fn apply_follows(&mut self, follows: Vec<FollowEntry>) {
        let mut followed = HashMap::new();
        let mut suppressed = Vec::new();
        for follow in follows {
            if self.settings.watch_all || follow.notifications {
                followed.insert(
                    follow.channel.id,
                    FollowedChannel {
                        channel: follow.channel,
                        notifications: follow.notifications,
                    },
                );
            } else {
                suppressed.push(follow.channel.display_name);
            }
        }
        if !suppressed.is_empty() {
            suppressed.sort_by_key(|name| name.to_lowercase());
            self.presentation.log_line(&format!(
                "Notifications disabled for: {}",
                suppressed.join(", ")
            ));
        }

        let mut sorted: Vec<Channel> = followed.values().map(|f| f.channel.clone()).collect();
        sorted.sort_by_cached_key(|c| (c.display_name.to_lowercase(), c.id));

        // live sessions of channels still followed keep their notified state
        self.last_notified.retain(|id, _| followed.contains_key(id));
        self.streams.clear();
        self.followed = followed;
        self.index = OnlineOfflineIndex::new(&sorted);
        self.presentation.init_channel_display(&sorted);

        tracing::info!(
            followed = sorted.len(),
            suppressed = suppressed.len(),
            "Channels reload complete"
        );
        self.last_reload = Some(Instant::now());
        self.follows_failures = 0;
        self.phase = Phase::Polling;
        self.presentation.set_refresh_in_progress(false);
    }

    fn follows_failed(&mut self, err: TwitchError) -> Result<Cycle, ReconcileError> {
        if self.follows_failures >= MAX_FOLLOWS_RETRIES {
            tracing::error!(
                failures = self.follows_failures + 1,
                "Giving up on followed channels list: {err}"
            );
            return Err(ReconcileError::FollowsUnavailable {
                failures: self.follows_failures + 1,
                source: err,
            });
        }
        self.follows_failures += 1;

        tracing::warn!(
            failures = self.follows_failures,
            "Error loading followed channels: {err}"
        );
        self.presentation
            .log_line(&format!("Error loading followed channels: {err}"));
        Ok(Cycle::wait(FOLLOWS_RETRY_WAIT, "retrying followed channels list"))
    }
}
