//! SettingsManager: environment-backed settings with defaults and feature status.

use std::collections::HashMap;

use super::defaults::DEFAULT_SETTINGS;
use super::validation::validate_setting;
use super::{FeatureStatus, SettingInfo, SettingType};

const MASK: &str = "********";

/// Validated setting values, falling back to defaults for anything unset.
#[derive(Debug, Clone, Default)]
pub struct SettingsManager {
    values: HashMap<String, String>,
}

impl SettingsManager {
    /// Read every known key from the process environment.
    pub fn from_env() -> Self {
        Self::from_pairs(
            DEFAULT_SETTINGS
                .keys()
                .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v))),
        )
    }

    /// Build from explicit key/value pairs.
    ///
    /// Empty values count as unset. Unknown keys and values that fail
    /// validation are logged and dropped, so their defaults apply.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = HashMap::new();
        for (key, value) in pairs {
            let key = key.into();
            let value = value.into().trim().to_string();
            if value.is_empty() {
                continue;
            }
            if !DEFAULT_SETTINGS.contains_key(key.as_str()) {
                tracing::warn!("Ignoring unknown setting: {key}");
                continue;
            }
            if let Err(e) = validate_setting(&key, &value) {
                tracing::warn!("Invalid value for {key} ({e}), using default");
                continue;
            }
            values.insert(key, value);
        }
        Self { values }
    }

    /// Get a setting value. Falls back to default if not set.
    pub fn get_setting(&self, key: &str) -> Result<String, anyhow::Error> {
        if let Some(val) = self.values.get(key) {
            return Ok(val.clone());
        }
        if let Some(def) = DEFAULT_SETTINGS.get(key) {
            return Ok(def.default.to_string());
        }
        anyhow::bail!("setting not found: {key}");
    }

    /// Every known setting, sorted by key, secrets masked.
    pub fn get_all_settings(&self) -> Vec<SettingInfo> {
        let mut result: Vec<SettingInfo> = DEFAULT_SETTINGS
            .values()
            .map(|def| {
                let value = self
                    .values
                    .get(def.key)
                    .cloned()
                    .unwrap_or_else(|| def.default.to_string());
                let has_value = !value.is_empty();
                SettingInfo {
                    key: def.key.to_string(),
                    value: if def.secret && has_value {
                        MASK.to_string()
                    } else {
                        value
                    },
                    setting_type: if def.secret {
                        SettingType::Secret
                    } else {
                        SettingType::Normal
                    },
                    required: def.required,
                    description: def.description.to_string(),
                    has_value,
                }
            })
            .collect();
        result.sort_by(|a, b| a.key.cmp(&b.key));
        result
    }

    /// Check which features are properly configured.
    pub fn check_feature_status(&self) -> FeatureStatus {
        let mut status = FeatureStatus {
            twitch_configured: true,
            popups_enabled: true,
            missing_settings: Vec::new(),
            warnings: Vec::new(),
        };

        for def in DEFAULT_SETTINGS.values().filter(|d| d.required) {
            if self.get_setting(def.key).unwrap_or_default().is_empty() {
                status.missing_settings.push(def.key.to_string());
                status.twitch_configured = false;
            }
        }
        status.missing_settings.sort();

        if self.get_setting("NO_POPUPS").unwrap_or_default() == "true" {
            status.popups_enabled = false;
            status
                .warnings
                .push("NO_POPUPS is enabled - no notifications will be shown".into());
        }
        if self.get_setting("WATCH_ALL").unwrap_or_default() == "true" {
            status
                .warnings
                .push("WATCH_ALL is enabled - per-follow notification settings are ignored".into());
        }

        status
    }
}
