use twitch_client::SCOPES;
use twitch_client::auth::{DEFAULT_REDIRECT_URI, authorize_url};

use crate::config::{AppConfig, SettingsManager};

/// Load configuration (fatal on error).
///
/// Reads `.env`, validates every setting, and refuses to start without
/// Twitch credentials.
pub fn init_foundation() -> Result<AppConfig, anyhow::Error> {
    load_dotenv();
    let sm = SettingsManager::from_env();

    for setting in sm.get_all_settings() {
        tracing::debug!(key = %setting.key, "{}", setting.value);
    }

    let status = sm.check_feature_status();
    for warning in &status.warnings {
        tracing::warn!("{warning}");
    }
    if !status.missing_settings.is_empty() {
        let client_id = sm.get_setting("CLIENT_ID").unwrap_or_default();
        if !client_id.is_empty() {
            match authorize_url(&client_id, DEFAULT_REDIRECT_URI, SCOPES) {
                Ok(url) => tracing::info!("Authorize this application at: {url}"),
                Err(e) => tracing::warn!("Failed to build authorization URL: {e}"),
            }
        }
        anyhow::bail!("Missing settings: {}", status.missing_settings.join(", "));
    }

    let config = AppConfig::load(&sm)?;
    tracing::info!(
        poll_secs = config.poll_interval.as_secs(),
        reload_mins = config.reload_interval.as_secs() / 60,
        "Settings loaded"
    );
    Ok(config)
}

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}
