//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

type DefTuple = (&'static str, &'static str, bool, bool, &'static str);

// (key, default, secret, required, description)
const DEFS: &[DefTuple] = &[
    ("CLIENT_ID", "", false, true, "Twitch application client ID"),
    (
        "OAUTH_TOKEN",
        "",
        true,
        true,
        "OAuth token with the user_read scope",
    ),
    (
        "USERNAME",
        "",
        false,
        false,
        "Login name whose follows are watched (resolved from the token if empty)",
    ),
    (
        "POLL_INTERVAL_SECS",
        "60",
        false,
        false,
        "Seconds between live stream polls (minimum 60)",
    ),
    (
        "RELOAD_INTERVAL_MINS",
        "10",
        false,
        false,
        "Minutes between followed channel list reloads",
    ),
    (
        "WATCH_ALL",
        "false",
        false,
        false,
        "Notify for every followed channel, ignoring per-follow settings",
    ),
    (
        "HTTP_RETRIES",
        "2",
        false,
        false,
        "Tries per page request before giving up",
    ),
    ("PAGE_SIZE", "25", false, false, "Items requested per page"),
    ("NO_POPUPS", "false", false, false, "Do not show notifications"),
    (
        "NOTIFICATION_DISPLAY_SECS",
        "5",
        false,
        false,
        "Seconds a notification stays on screen",
    ),
    ("DEBUG_OUTPUT", "false", false, false, "Verbose logging"),
    (
        "API_BASE_URL",
        "https://api.twitch.tv/kraken",
        false,
        false,
        "Root of the Kraken API",
    ),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub secret: bool,
    pub required: bool,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, secret, required, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    secret,
                    required,
                    description,
                },
            )
        })
        .collect()
});

/// Get the default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}
