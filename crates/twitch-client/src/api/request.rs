use std::future::Future;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use url::Url;

use super::*;
use crate::TwitchError;
use crate::auth::normalize_oauth_token;

/// Status and fully read body of a GET request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP seam used by [`PagedFetcher`] and the one-shot lookups.
///
/// Implementations return non-200 responses as `Ok`; callers decide what
/// a status means.
pub trait Transport: Sync {
    /// Base URL that endpoint paths are appended to.
    fn base_url(&self) -> &str;

    fn get(&self, url: Url) -> impl Future<Output = Result<RawResponse, TwitchError>> + Send;
}

/// Join `path` onto `base` and append `params` in order.
///
/// An empty path addresses the API root.
pub fn endpoint_url(
    base: &str,
    path: &str,
    params: &[(String, String)],
) -> Result<Url, TwitchError> {
    let base = base.trim_end_matches('/');
    let path = path.trim_matches('/');
    let joined = if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    };
    let mut url = Url::parse(&joined)?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

impl KrakenClient {
    pub fn new(client_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: KRAKEN_BASE.to_string(),
            client_id,
            oauth_token: None,
        }
    }

    /// Point the client at another API root (mirrors, local proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send `Authorization: OAuth <token>` on every following request.
    ///
    /// A TMI-style `oauth:` prefix is stripped first.
    pub fn set_oauth_token(&mut self, token: &str) {
        let normalized = normalize_oauth_token(token);
        self.oauth_token = if normalized.is_empty() {
            None
        } else {
            Some(normalized)
        };
    }

    pub fn is_authenticated(&self) -> bool {
        self.oauth_token.is_some()
    }

    /// Build the request headers for the current auth state.
    fn headers(&self) -> Result<HeaderMap, TwitchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V3));
        headers.insert("Client-ID", header_value(&self.client_id)?);
        if let Some(token) = &self.oauth_token {
            headers.insert(AUTHORIZATION, header_value(&format!("OAuth {token}"))?);
        }
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, TwitchError> {
    HeaderValue::from_str(value)
        .map_err(|e| TwitchError::Protocol(format!("invalid header value: {e}")))
}

impl Transport for KrakenClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, url: Url) -> Result<RawResponse, TwitchError> {
        tracing::debug!(url = %url, "GET");
        let headers = self.headers()?;
        let resp = self.http.get(url).headers(headers).send().await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(RawResponse { status, body })
    }
}
