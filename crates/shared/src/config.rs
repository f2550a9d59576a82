use serde::{Deserialize, Serialize};

/// Branding and feature flags for the ordering front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub page_title: String,
    pub page_description: String,
    pub company_name: String,

    pub supports_chat_input: bool,
    pub supports_video_input: bool,
    pub supports_screen_share: bool,
    pub is_pre_connect_buffer_enabled: bool,

    pub logo: String,
    pub start_button_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_dark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_dark: Option<String>,

    // hosted sandbox environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            company_name: "Starbucks".into(),
            page_title: "Starbucks Barista".into(),
            page_description: "Your personal AI Barista".into(),

            supports_chat_input: true,
            supports_video_input: true,
            supports_screen_share: true,
            is_pre_connect_buffer_enabled: true,

            logo: "/lk-logo.svg".into(),
            accent: Some("#00704A".into()),
            logo_dark: Some("/lk-logo-dark.svg".into()),
            accent_dark: Some("#00704A".into()),
            start_button_text: "Start Order".into(),

            sandbox_id: None,
            agent_name: None,
        }
    }
}

impl AppConfig {
    /// Accent for the requested theme, falling back to the light accent.
    pub fn accent_for(&self, dark: bool) -> Option<&str> {
        if dark {
            self.accent_dark.as_deref().or(self.accent.as_deref())
        } else {
            self.accent.as_deref()
        }
    }

    pub fn logo_for(&self, dark: bool) -> &str {
        if dark {
            self.logo_dark.as_deref().unwrap_or(&self.logo)
        } else {
            &self.logo
        }
    }
}
