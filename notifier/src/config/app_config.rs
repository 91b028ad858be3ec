//! Runtime application configuration loaded from the settings manager.

use std::time::Duration;

use twitch_client::api::KRAKEN_BASE;

use super::manager::SettingsManager;

/// Runtime configuration populated from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client_id: String,
    pub oauth_token: Option<String>,
    pub username: Option<String>,
    pub poll_interval: Duration,
    pub reload_interval: Duration,
    pub watch_all: bool,
    pub http_retries: u32,
    pub page_size: u64,
    pub no_popups: bool,
    pub notification_display: Duration,
    pub debug_output: bool,
    pub api_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            oauth_token: None,
            username: None,
            poll_interval: Duration::from_secs(60),
            reload_interval: Duration::from_secs(10 * 60),
            watch_all: false,
            http_retries: 2,
            page_size: 25,
            no_popups: false,
            notification_display: Duration::from_secs(5),
            debug_output: false,
            api_base_url: KRAKEN_BASE.into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the settings manager.
    pub fn load(sm: &SettingsManager) -> Result<Self, anyhow::Error> {
        let g = |key: &str| -> String { sm.get_setting(key).unwrap_or_default() };
        let defaults = Self::default();

        Ok(Self {
            client_id: g("CLIENT_ID"),
            oauth_token: non_empty(g("OAUTH_TOKEN")),
            username: non_empty(g("USERNAME")),
            poll_interval: Duration::from_secs(parse_u64(
                &g("POLL_INTERVAL_SECS"),
                defaults.poll_interval.as_secs(),
            )),
            reload_interval: Duration::from_secs(
                60 * parse_u64(
                    &g("RELOAD_INTERVAL_MINS"),
                    defaults.reload_interval.as_secs() / 60,
                ),
            ),
            watch_all: g("WATCH_ALL") == "true",
            http_retries: parse_u64(&g("HTTP_RETRIES"), u64::from(defaults.http_retries))
                .try_into()
                .unwrap_or(defaults.http_retries),
            page_size: parse_u64(&g("PAGE_SIZE"), defaults.page_size),
            no_popups: g("NO_POPUPS") == "true",
            notification_display: Duration::from_secs(parse_u64(
                &g("NOTIFICATION_DISPLAY_SECS"),
                defaults.notification_display.as_secs(),
            )),
            debug_output: g("DEBUG_OUTPUT") == "true",
            api_base_url: {
                let url = g("API_BASE_URL");
                if url.is_empty() { defaults.api_base_url } else { url }
            },
        })
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn parse_u64(s: &str, default: u64) -> u64 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}
