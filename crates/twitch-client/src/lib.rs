//! Twitch Kraken (v3) client library.
//!
//! Provides the offset/limit paged query protocol, typed models for
//! follows and live streams, and OAuth token helpers.

pub mod api;
pub mod auth;

/// Unified error type for the twitch-client crate.
#[derive(Debug, thiserror::Error)]
pub enum TwitchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-200 response. The only retryable failure.
    #[error("Got HTTP status code {status} during page request")]
    Status { status: u16, message: String },

    #[error("Response was malformed: {0}")]
    Protocol(String),

    #[error("Response object was missing the '{0}' field")]
    MissingField(String),

    #[error("Response object '_total' was {total} but the page was empty")]
    InconsistentTotal { total: u64 },

    #[error("The API returned an error field in the response: {0}")]
    ApiReported(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl TwitchError {
    /// HTTP status carried by the error, if it came from a non-200 response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a retry of the same request may succeed.
    ///
    /// Only non-200 responses qualify; protocol and consistency failures
    /// point at a contract mismatch and will not heal on their own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}

/// OAuth scopes required by this application.
pub const SCOPES: &[&str] = &["user_read"];
