//! Setting value validation.

use regex::Regex;
use std::sync::LazyLock;

static RE_CLIENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z]{1,64}$").unwrap());
static RE_OAUTH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(oauth:)?[0-9A-Za-z]{1,64}$").unwrap());
static RE_USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_]{1,25}$").unwrap());

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
///
/// Empty strings are accepted for the credential keys; whether they are
/// required is decided by the feature check, not here.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "CLIENT_ID" => {
            if !value.is_empty() && !RE_CLIENT_ID.is_match(value) {
                return Err("must be alphanumeric".into());
            }
        }
        "OAUTH_TOKEN" => {
            if !value.is_empty() && !RE_OAUTH_TOKEN.is_match(value) {
                return Err("must be an alphanumeric token, optionally prefixed with 'oauth:'".into());
            }
        }
        "USERNAME" => {
            if !value.is_empty() && !RE_USERNAME.is_match(value) {
                return Err("must be 1-25 letters, digits or underscores".into());
            }
        }
        "POLL_INTERVAL_SECS" => validate_int_range(value, 60, 86_400)?,
        "RELOAD_INTERVAL_MINS" => validate_int_range(value, 1, 1_440)?,
        "HTTP_RETRIES" => validate_int_range(value, 1, 10)?,
        "PAGE_SIZE" => validate_int_range(value, 1, 100)?,
        "NOTIFICATION_DISPLAY_SECS" => validate_int_range(value, 1, 60)?,
        "API_BASE_URL" => {
            let url = url::Url::parse(value).map_err(|e| format!("invalid URL: {e}"))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err("must be an http or https URL".into());
            }
        }
        // Boolean settings
        k if is_boolean_setting(k) => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i64, max: i64) -> Result<(), String> {
    let v: i64 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}

pub(crate) fn is_boolean_setting(key: &str) -> bool {
    matches!(key, "WATCH_ALL" | "NO_POPUPS" | "DEBUG_OUTPUT")
}
