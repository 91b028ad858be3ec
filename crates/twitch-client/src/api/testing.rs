//! In-memory [`Transport`] for tests.
//!
//! Responses are registered per full request URL (query string included).
//! A URL with a sequence of responses answers with them in order and keeps
//! repeating the last one.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use url::Url;

use super::*;
use crate::TwitchError;

pub struct FakeTransport {
    base_url: String,
    routes: Mutex<HashMap<String, VecDeque<RawResponse>>>,
    requests: Mutex<Vec<String>>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::with_base_url(KRAKEN_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            routes: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request for `url` with `status` and `body`.
    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.respond_sequence(url, [(status, body)]);
    }

    /// Answer successive requests for `url` with the given responses.
    pub fn respond_sequence<'b>(
        &self,
        url: &str,
        responses: impl IntoIterator<Item = (u16, &'b str)>,
    ) {
        let queue = responses
            .into_iter()
            .map(|(status, body)| RawResponse {
                status,
                body: body.to_string(),
            })
            .collect();
        self.lock_routes().insert(url.to_string(), queue);
    }

    /// Forget all registered responses and recorded requests.
    pub fn reset(&self) {
        self.lock_routes().clear();
        self.lock_requests().clear();
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.lock_requests().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.lock_requests().iter().filter(|u| *u == url).count()
    }

    fn lock_routes(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<RawResponse>>> {
        self.routes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_requests(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn answer(&self, url: &Url) -> Result<RawResponse, TwitchError> {
        self.lock_requests().push(url.to_string());

        let mut routes = self.lock_routes();
        let response = routes.get_mut(url.as_str()).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });
        response.ok_or_else(|| TwitchError::Protocol(format!("no responder registered for {url}")))
    }
}

impl Transport for FakeTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, url: Url) -> Result<RawResponse, TwitchError> {
        self.answer(&url)
    }
}
