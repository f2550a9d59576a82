use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Misconfigured,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Reasons an inbound agent event could not be turned into an [`crate::protocol::AgentEvent`].
#[derive(Debug, Error)]
pub enum AgentEventError {
    #[error("agent event payload is not valid utf-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("agent event payload is not valid json: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("agent event has no string `type` field")]
    MissingType,
    #[error("agent event `{kind}` has a malformed `data` payload: {source}")]
    MalformedPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
