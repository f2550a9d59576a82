use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{ImagePreview, OrderRecord, ParticipantIdentity, RoomName},
    error::AgentEventError,
};

/// Data-channel topic the agent publishes UI events on.
pub const AGENT_EVENTS_TOPIC: &str = "agent_events";

pub const IMAGE_EVENT: &str = "image";
pub const ORDER_SAVED_EVENT: &str = "order_saved";

/// Structured notification pushed by the remote agent.
///
/// On the wire this is `{"type": <tag>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AgentEvent {
    Image(ImagePreview),
    OrderSaved(OrderRecord),
}

impl AgentEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::Image(_) => IMAGE_EVENT,
            AgentEvent::OrderSaved(_) => ORDER_SAVED_EVENT,
        }
    }

    /// Decodes a raw data-channel payload.
    ///
    /// Returns `Ok(None)` when the payload is well formed but carries a `type`
    /// this build does not know about.
    pub fn decode(payload: &[u8]) -> Result<Option<AgentEvent>, AgentEventError> {
        let text = std::str::from_utf8(payload)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let value: Value = serde_json::from_str(text).map_err(AgentEventError::InvalidJson)?;

        let Some(kind) = value.get("type").and_then(Value::as_str) else {
            return Err(AgentEventError::MissingType);
        };
        let data = value.get("data").cloned().unwrap_or(Value::Null);

        let malformed = |source| AgentEventError::MalformedPayload {
            kind: kind.to_string(),
            source,
        };
        let event = match kind {
            IMAGE_EVENT => AgentEvent::Image(serde_json::from_value(data).map_err(malformed)?),
            ORDER_SAVED_EVENT => {
                AgentEvent::OrderSaved(serde_json::from_value(data).map_err(malformed)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Reads only the `type` tag, for logging payloads that were not dispatched.
    pub fn peek_kind(payload: &[u8]) -> Option<String> {
        let text = std::str::from_utf8(payload).ok()?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let value: Value = serde_json::from_str(text).ok()?;
        value.get("type")?.as_str().map(str::to_string)
    }

    pub fn encode(&self) -> Vec<u8> {
        // Both variants hold only strings and numbers, which always serialize.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentDispatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomConfig {
    #[serde(default)]
    pub agents: Vec<AgentDispatch>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionDetailsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_config: Option<RoomConfig>,
}

impl ConnectionDetailsRequest {
    pub fn agent_name(&self) -> Option<&str> {
        self.room_config
            .as_ref()?
            .agents
            .first()?
            .agent_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetails {
    pub server_url: String,
    pub room_name: RoomName,
    pub participant_name: ParticipantIdentity,
    pub participant_token: String,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
