use std::{collections::HashMap, fs, path::Path};

use tracing::warn;

pub const SETTINGS_FILE: &str = "course_client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    /// Whole seconds; zero is rejected while loading.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000".into(),
            request_timeout_secs: None,
        }
    }
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// File values override defaults; env values override the file.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("api_base_url").and_then(|v| v.as_str()) {
                    settings.api_base_url = v.to_string();
                }
                if let Some(v) = file_cfg.get("request_timeout_secs") {
                    match v
                        .as_integer()
                        .and_then(|secs| u64::try_from(secs).ok())
                        .filter(|secs| *secs > 0)
                    {
                        Some(secs) => settings.request_timeout_secs = Some(secs),
                        None => warn!("ignoring invalid request_timeout_secs in {}", path.display()),
                    }
                }
            }
            Err(err) => warn!("ignoring unreadable settings file {}: {err}", path.display()),
        }
    }

    if let Some(v) = env("COURSE_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>().ok().filter(|secs| *secs > 0) {
            Some(parsed) => settings.request_timeout_secs = Some(parsed),
            None => warn!("ignoring invalid APP__REQUEST_TIMEOUT_SECS={v}"),
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
