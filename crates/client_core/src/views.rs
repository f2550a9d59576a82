//! View models for the welcome screen and the session chrome.

use chrono::{Datelike, Local};
use shared::config::AppConfig;

pub const WELCOME_TAGLINE: &str = "Your personal AI coffee companion. Ready to take your order?";
pub const WELCOME_FOOTER: &str = "Powered by LiveKit & Murf AI";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeView {
    pub title: String,
    pub tagline: &'static str,
    pub start_button_text: String,
    pub footer: &'static str,
    pub accent: Option<String>,
}

impl WelcomeView {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            title: config.page_title.clone(),
            tagline: WELCOME_TAGLINE,
            start_button_text: config.start_button_text.clone(),
            footer: WELCOME_FOOTER,
            accent: config.accent.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlBarControls {
    pub leave: bool,
    pub microphone: bool,
    pub chat: bool,
    pub camera: bool,
    pub screen_share: bool,
}

impl ControlBarControls {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            leave: true,
            microphone: true,
            chat: config.supports_chat_input,
            camera: config.supports_video_input,
            screen_share: config.supports_screen_share,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChrome {
    pub brand: String,
    pub footer: String,
}

impl SessionChrome {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::for_year(config, Local::now().year())
    }

    pub fn for_year(config: &AppConfig, year: i32) -> Self {
        Self {
            brand: config.company_name.to_uppercase(),
            footer: format!(
                "© {year} {} Coffee Company. All rights reserved.",
                config.company_name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_uses_config_copy() {
        let config = AppConfig {
            start_button_text: "Order now".into(),
            ..AppConfig::default()
        };
        let view = WelcomeView::from_config(&config);
        assert_eq!(view.title, "Starbucks Barista");
        assert_eq!(view.start_button_text, "Order now");
        assert_eq!(view.accent.as_deref(), Some("#00704A"));
    }

    #[test]
    fn controls_follow_feature_flags() {
        let config = AppConfig {
            supports_chat_input: false,
            supports_video_input: true,
            supports_screen_share: false,
            ..AppConfig::default()
        };
        let controls = ControlBarControls::from_config(&config);
        assert!(controls.leave && controls.microphone);
        assert!(!controls.chat);
        assert!(controls.camera);
        assert!(!controls.screen_share);
    }

    #[test]
    fn chrome_brands_with_company_name() {
        let chrome = SessionChrome::for_year(&AppConfig::default(), 2025);
        assert_eq!(chrome.brand, "STARBUCKS");
        assert_eq!(
            chrome.footer,
            "© 2025 Starbucks Coffee Company. All rights reserved."
        );
    }
}
