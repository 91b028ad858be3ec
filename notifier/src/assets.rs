//! Channel logo loading on a small worker pool.
//!
//! Fetches run off the controller, at most [`LOGO_CONCURRENCY`] at a time,
//! and report back by posting [`LogoFetched`]. Every new request bumps a
//! generation counter; results from older generations are stale and
//! should be dropped by the receiver.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use twitch_client::api::ChannelId;

use crate::scheduler::DeferredCallScheduler;

pub const LOGO_CONCURRENCY: usize = 3;

/// Downloads logo images.
pub trait LogoFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, String>> + Send;
}

/// [`LogoFetcher`] over plain HTTP GET.
#[derive(Debug, Clone, Default)]
pub struct HttpLogoFetcher {
    client: reqwest::Client,
}

impl HttpLogoFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogoFetcher for HttpLogoFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("error requesting {url}: {e}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("Got HTTP error {status} retrieving {url}"));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| format!("error reading {url}: {e}"))?;
        Ok(bytes.to_vec())
    }
}

/// Outcome of one logo fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoFetched {
    pub generation: u64,
    pub channel_id: ChannelId,
    pub url: String,
    pub image: Result<Vec<u8>, String>,
}

pub struct LogoLoader<F, M> {
    fetcher: Arc<F>,
    permits: Arc<Semaphore>,
    generation: u64,
    scheduler: DeferredCallScheduler<M>,
}

impl<F, M> LogoLoader<F, M>
where
    F: LogoFetcher,
    M: From<LogoFetched> + Send + 'static,
{
    pub fn new(fetcher: F, scheduler: DeferredCallScheduler<M>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            permits: Arc::new(Semaphore::new(LOGO_CONCURRENCY)),
            generation: 0,
            scheduler,
        }
    }

    /// Start loading a logo, superseding every earlier request.
    pub fn request(&mut self, channel_id: ChannelId, url: &str) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let fetcher = Arc::clone(&self.fetcher);
        let permits = Arc::clone(&self.permits);
        let scheduler = self.scheduler.clone();
        let url = url.to_string();

        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let image = fetcher.fetch(&url).await;
            scheduler.post(M::from(LogoFetched {
                generation,
                channel_id,
                url,
                image,
            }));
        });
        generation
    }

    /// Drop interest in every request made so far.
    pub fn cancel_all(&mut self) {
        self.generation += 1;
    }

    /// Whether `fetched` answers the latest request.
    pub fn is_current(&self, fetched: &LogoFetched) -> bool {
        fetched.generation == self.generation
    }
}
