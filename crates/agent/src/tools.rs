use std::sync::Arc;

use livekit_integration::{DataPacketKind, LiveKitRoomSession};
use serde::Deserialize;
use serde_json::Value;
use shared::{
    domain::{ImagePreview, OrderRecord},
    protocol::{AgentEvent, AGENT_EVENTS_TOPIC},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::pricing::price_order;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("invalid arguments for '{tool}': {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
}

pub const SAVE_ORDER: ToolSpec = ToolSpec {
    name: "save_order",
    description: "Save the customer's order details. Use this tool ONLY when the customer has confirmed their order.",
};

pub const GET_LAST_ORDER: ToolSpec = ToolSpec {
    name: "get_last_order",
    description: "Retrieve the customer's last order (the 'usual'). Use this tool when the customer asks for 'the usual' or asks what they ordered last time.",
};

pub const SHOW_IMAGE: ToolSpec = ToolSpec {
    name: "show_image",
    description: "Show a generated image of the drink to the customer.",
};

#[derive(Debug, Clone, Deserialize)]
pub struct SaveOrderArgs {
    pub drink_type: String,
    pub size: String,
    pub milk: String,
    #[serde(default)]
    pub extras: Vec<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShowImageArgs {
    pub url: String,
    pub prompt: String,
}

/// Function tools exposed to the language model.
///
/// Results are the strings the model reads back to the customer, so
/// publishing failures are reported in the result rather than as errors.
pub struct BaristaTools {
    room: Option<Arc<dyn LiveKitRoomSession>>,
    last_order: Mutex<Option<OrderRecord>>,
}

impl BaristaTools {
    pub fn new(room: Option<Arc<dyn LiveKitRoomSession>>) -> Self {
        Self {
            room,
            last_order: Mutex::new(None),
        }
    }

    pub fn specs() -> [ToolSpec; 3] {
        [SAVE_ORDER, GET_LAST_ORDER, SHOW_IMAGE]
    }

    /// Runs a tool call by name with JSON arguments.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<String, ToolError> {
        match name {
            "save_order" => {
                let args = serde_json::from_value(args).map_err(|source| {
                    ToolError::InvalidArguments {
                        tool: SAVE_ORDER.name,
                        source,
                    }
                })?;
                Ok(self.save_order(args).await)
            }
            "get_last_order" => Ok(self.get_last_order().await),
            "show_image" => {
                let args = serde_json::from_value(args).map_err(|source| {
                    ToolError::InvalidArguments {
                        tool: SHOW_IMAGE.name,
                        source,
                    }
                })?;
                Ok(self.show_image(args).await)
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub async fn save_order(&self, args: SaveOrderArgs) -> String {
        info!(name = %args.name, size = %args.size, drink = %args.drink_type, "saving order");

        let price = price_order(&args.size, &args.extras);
        let order = OrderRecord {
            drink_type: args.drink_type,
            size: args.size,
            milk: args.milk,
            extras: args.extras,
            name: args.name,
            price,
        };
        *self.last_order.lock().await = Some(order.clone());

        if let Err(err) = self.publish(AgentEvent::OrderSaved(order)).await {
            error!(error = %err, "failed to publish order_saved event");
            return format!("Error saving order: {err}");
        }
        format!("Order saved! Total is ₹{price}.")
    }

    pub async fn get_last_order(&self) -> String {
        info!("retrieving last order");
        match self.last_order.lock().await.as_ref() {
            Some(order) => format!(
                "Found the last order: {} {} with {} milk. Extras: {}.",
                order.size,
                order.drink_type,
                order.milk,
                order.extras.join(", ")
            ),
            None => "I couldn't find any previous orders.".to_string(),
        }
    }

    pub async fn show_image(&self, args: ShowImageArgs) -> String {
        let event = AgentEvent::Image(ImagePreview {
            url: args.url,
            prompt: args.prompt,
        });
        match self.publish(event).await {
            Ok(()) => "Showing the image now.".to_string(),
            Err(err) => {
                error!(error = %err, "failed to publish image event");
                format!("Error showing image: {err}")
            }
        }
    }

    async fn publish(&self, event: AgentEvent) -> anyhow::Result<()> {
        let Some(room) = &self.room else {
            warn!(kind = event.kind(), "cannot publish event: room not available");
            return Ok(());
        };
        room.publish_data(
            event.encode(),
            Some(AGENT_EVENTS_TOPIC),
            DataPacketKind::Reliable,
        )
        .await?;
        info!(kind = event.kind(), "published agent event");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/tools_tests.rs"]
mod tests;
