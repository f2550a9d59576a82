use super::{load_settings_from, validated_livekit_url, Settings};

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_without_file_or_env() {
    let settings = load_settings_from(None, env_from(&[])).expect("settings");
    let defaults = Settings::default();
    assert_eq!(settings.server_bind, defaults.server_bind);
    assert_eq!(settings.livekit_url, None);
    assert_eq!(settings.app.company_name, "Starbucks");
}

#[test]
fn env_overrides_file() {
    let file = r#"
        bind_addr = "0.0.0.0:8080"
        livekit_url = "wss://from-file.test"
    "#;
    let settings = load_settings_from(
        Some(file),
        env_from(&[
            ("LIVEKIT_URL", "wss://from-env.test"),
            ("LIVEKIT_API_KEY", "key"),
            ("APP__LIVEKIT_TTL_SECONDS", "120"),
            ("APP__AGENT_NAME", "barista"),
        ]),
    )
    .expect("settings");

    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.livekit_url.as_deref(), Some("wss://from-env.test"));
    assert_eq!(settings.livekit_api_key, "key");
    assert_eq!(settings.livekit_ttl_seconds, 120);
    assert_eq!(settings.app.agent_name.as_deref(), Some("barista"));
}

#[test]
fn unparsable_ttl_keeps_default() {
    let settings = load_settings_from(None, env_from(&[("APP__LIVEKIT_TTL_SECONDS", "soon")]))
        .expect("settings");
    assert_eq!(settings.livekit_ttl_seconds, Settings::default().livekit_ttl_seconds);
}

#[test]
fn malformed_settings_file_is_an_error() {
    assert!(load_settings_from(Some("bind_addr = ["), env_from(&[])).is_err());
}

#[test]
fn app_config_file_is_loaded_from_settings() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("barista_app_config_{suffix}.toml"));
    fs::write(&path, "pageTitle = \"Night Owl Barista\"\nsupportsChatInput = false\n")
        .expect("write app config");

    let file = format!("app_config = {:?}", path.to_string_lossy());
    let settings = load_settings_from(Some(&file), env_from(&[])).expect("settings");

    assert_eq!(settings.app.page_title, "Night Owl Barista");
    assert!(!settings.app.supports_chat_input);
    assert!(settings.app.supports_video_input);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn livekit_url_must_be_present_and_valid() {
    assert!(validated_livekit_url(None).is_err());
    assert!(validated_livekit_url(Some("  ")).is_err());
    assert!(validated_livekit_url(Some("not a url")).is_err());
    assert!(validated_livekit_url(Some("ftp://rtc.test")).is_err());
    assert_eq!(
        validated_livekit_url(Some("wss://rtc.test")).expect("valid"),
        "wss://rtc.test"
    );
}
