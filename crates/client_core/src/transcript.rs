//! Chat transcript shown in the session view.

use serde::{Deserialize, Serialize};
use shared::{config::AppConfig, domain::ParticipantIdentity};

/// Data-channel topic chat messages travel on.
pub const CHAT_TOPIC: &str = "lk.chat";

pub const LISTENING_PLACEHOLDER: &str = "Listening...";
pub const PRE_CONNECT_HINT: &str = "Agent is listening, ask it a question";

/// Chat message as it appears on the data channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatWireMessage {
    pub id: String,
    pub timestamp: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOrigin {
    Local,
    Remote(ParticipantIdentity),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub timestamp: i64,
    pub message: String,
    pub from: ChatOrigin,
}

impl ChatMessage {
    pub fn is_local(&self) -> bool {
        self.from == ChatOrigin::Local
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    /// Inserts `message` keeping the transcript ordered by timestamp.
    /// Messages with equal timestamps keep arrival order.
    pub fn push(&mut self, message: ChatMessage) {
        let index = self
            .messages
            .partition_point(|existing| existing.timestamp <= message.timestamp);
        self.messages.insert(index, message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_user_message(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_local())
            .map(|m| m.message.as_str())
            .unwrap_or(LISTENING_PLACEHOLDER)
    }

    /// The view jumps to the bottom only after the local user spoke last.
    pub fn should_autoscroll(&self) -> bool {
        self.messages.last().is_some_and(ChatMessage::is_local)
    }

    pub fn pre_connect_hint(&self, config: &AppConfig) -> Option<&'static str> {
        (config.is_pre_connect_buffer_enabled && self.messages.is_empty())
            .then_some(PRE_CONNECT_HINT)
    }
}
