use std::{collections::HashMap, fs};

use anyhow::Context;
use shared::config::AppConfig;
use url::Url;

pub const SETTINGS_FILE: &str = "barista.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub livekit_api_key: String,
    pub livekit_api_secret: String,
    pub livekit_url: Option<String>,
    pub livekit_ttl_seconds: i64,
    pub app: AppConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            livekit_api_key: "devkey".into(),
            livekit_api_secret: "devsecret".into(),
            livekit_url: None,
            livekit_ttl_seconds: 15 * 60,
            app: AppConfig::default(),
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(SETTINGS_FILE).ok();
    load_settings_from(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the flat settings file, then the environment.
pub fn load_settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        let file_cfg = toml::from_str::<HashMap<String, String>>(raw)
            .with_context(|| format!("failed to parse {SETTINGS_FILE}"))?;
        if let Some(v) = file_cfg.get("bind_addr") {
            settings.server_bind = v.clone();
        }
        if let Some(v) = file_cfg.get("livekit_url") {
            settings.livekit_url = Some(v.clone());
        }
        if let Some(path) = file_cfg.get("app_config") {
            settings.app = load_app_config(path)?;
        }
    }

    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("LIVEKIT_URL") {
        settings.livekit_url = Some(v);
    }
    if let Some(v) = env("LIVEKIT_API_KEY") {
        settings.livekit_api_key = v;
    }
    if let Some(v) = env("LIVEKIT_API_SECRET") {
        settings.livekit_api_secret = v;
    }

    if let Some(v) = env("APP__LIVEKIT_TTL_SECONDS") {
        if let Ok(parsed) = v.parse::<i64>() {
            settings.livekit_ttl_seconds = parsed;
        }
    }

    if let Some(v) = env("APP__SANDBOX_ID") {
        settings.app.sandbox_id = Some(v);
    }
    if let Some(v) = env("APP__AGENT_NAME") {
        settings.app.agent_name = Some(v);
    }

    Ok(settings)
}

fn load_app_config(path: &str) -> anyhow::Result<AppConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read app config '{path}'"))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse app config '{path}'"))
}

/// The LiveKit URL handed to clients, if one is configured and well formed.
pub fn validated_livekit_url(raw: Option<&str>) -> anyhow::Result<String> {
    let raw = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .context("LIVEKIT_URL is not defined")?;
    let url = Url::parse(raw).with_context(|| format!("LIVEKIT_URL '{raw}' is not a valid url"))?;
    match url.scheme() {
        "ws" | "wss" | "http" | "https" => Ok(raw.to_string()),
        other => anyhow::bail!("LIVEKIT_URL has unsupported scheme '{other}'"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
