use serde::de::DeserializeOwned;

use super::*;
use crate::TwitchError;

/// Bounded retry of HTTP-status failures for paged requests.
///
/// The budget applies per call: opening a query and every single
/// [`next`](Self::next) each get `http_tries` attempts of their own.
/// Only [`TwitchError::Status`] outcomes are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    http_tries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { http_tries: 2 }
    }
}

impl RetryPolicy {
    /// `http_tries` is the total number of attempts, at least one.
    pub fn new(http_tries: u32) -> Self {
        Self {
            http_tries: http_tries.max(1),
        }
    }

    pub fn http_tries(&self) -> u32 {
        self.http_tries
    }

    /// [`PagedFetcher::open`] with retries on HTTP status errors.
    pub async fn open<'a, T: Transport>(
        &self,
        transport: &'a T,
        query: &PagedQuery,
    ) -> Result<PagedFetcher<'a, T>, TwitchError> {
        let mut tries_left = self.http_tries;
        loop {
            let err = match PagedFetcher::open(transport, query.clone()).await {
                Ok(fetcher) => return Ok(fetcher),
                Err(e) => e,
            };
            if !self.should_retry(&err, &mut tries_left) {
                return Err(err);
            }
            tracing::warn!(
                path = %query.path,
                status = err.status(),
                tries_left,
                "Got HTTP error while doing initial pager request"
            );
        }
    }

    /// [`PagedFetcher::next`] with retries on HTTP status errors.
    pub async fn next<T: Transport, D: DeserializeOwned>(
        &self,
        fetcher: &mut PagedFetcher<'_, T>,
    ) -> Result<D, TwitchError> {
        let mut tries_left = self.http_tries;
        loop {
            let err = match fetcher.next().await {
                Ok(item) => return Ok(item),
                Err(e) => e,
            };
            if !self.should_retry(&err, &mut tries_left) {
                return Err(err);
            }
            tracing::warn!(
                path = %fetcher.query().path,
                status = err.status(),
                tries_left,
                "Got HTTP error while loading item"
            );
        }
    }

    fn should_retry(&self, err: &TwitchError, tries_left: &mut u32) -> bool {
        if !err.is_retryable() {
            return false;
        }
        *tries_left = tries_left.saturating_sub(1);
        *tries_left > 0
    }
}
