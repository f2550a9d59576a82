use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use shared::domain::{ParticipantIdentity, RoomName};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct LiveKitConfig {
    pub api_key: String,
    pub api_secret: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenGrants {
    pub can_publish: bool,
    pub can_subscribe: bool,
    pub can_publish_data: bool,
}

impl Default for TokenGrants {
    fn default() -> Self {
        Self {
            can_publish: true,
            can_subscribe: true,
            can_publish_data: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("participant identity must not be empty")]
    EmptyIdentity,
    #[error("token ttl must be positive, got {0}s")]
    InvalidTtl(i64),
    #[error("failed to sign access token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoGrant {
    room_join: bool,
    room: String,
    can_publish: bool,
    can_subscribe: bool,
    can_publish_data: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentDispatchClaim {
    agent_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomConfigClaim {
    agents: Vec<AgentDispatchClaim>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    iss: String,
    sub: String,
    name: String,
    nbf: i64,
    iat: i64,
    exp: i64,
    video: VideoGrant,
    #[serde(skip_serializing_if = "Option::is_none")]
    room_config: Option<RoomConfigClaim>,
}

/// Signs a participant access token for `room`.
///
/// When `agent_name` is set the token asks the server to dispatch that agent
/// into the room on join.
pub fn mint_token(
    cfg: &LiveKitConfig,
    identity: &ParticipantIdentity,
    room: &RoomName,
    grants: TokenGrants,
    agent_name: Option<&str>,
) -> Result<String, TokenError> {
    if identity.as_str().trim().is_empty() {
        return Err(TokenError::EmptyIdentity);
    }
    if cfg.ttl_seconds <= 0 {
        return Err(TokenError::InvalidTtl(cfg.ttl_seconds));
    }

    let now = Utc::now();
    let exp = now + Duration::seconds(cfg.ttl_seconds);
    let claims = Claims {
        iss: cfg.api_key.clone(),
        sub: identity.to_string(),
        name: identity.to_string(),
        nbf: now.timestamp(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
        video: VideoGrant {
            room_join: true,
            room: room.to_string(),
            can_publish: grants.can_publish,
            can_subscribe: grants.can_subscribe,
            can_publish_data: grants.can_publish_data,
        },
        room_config: agent_name.map(|name| RoomConfigClaim {
            agents: vec![AgentDispatchClaim {
                agent_name: name.to_string(),
            }],
        }),
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.api_secret.as_bytes()),
    )?)
}

#[cfg(test)]
#[path = "tests/token_tests.rs"]
mod tests;
