//! Routing of `agent_events` data packets into session state.

use shared::{
    domain::{ImagePreview, OrderRecord, ParticipantIdentity},
    error::AgentEventError,
    protocol::{AgentEvent, AGENT_EVENTS_TOPIC},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::transcript::ChatTranscript;

const ORDER_NOTIFICATION_CAPACITY: usize = 16;

/// View state owned by a session; replaced field by field as events arrive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub generated_image: Option<ImagePreview>,
    pub chat_open: bool,
    pub transcript: ChatTranscript,
    pub remote_participants: Vec<ParticipantIdentity>,
}

/// Fan-out of saved orders to every receipt view listening on this session.
#[derive(Debug, Clone)]
pub struct OrderNotifier {
    tx: broadcast::Sender<OrderRecord>,
}

impl Default for OrderNotifier {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(ORDER_NOTIFICATION_CAPACITY);
        Self { tx }
    }
}

impl OrderNotifier {
    pub fn subscribe(&self) -> broadcast::Receiver<OrderRecord> {
        self.tx.subscribe()
    }

    /// Returns how many listeners received the order.
    pub fn notify(&self, order: OrderRecord) -> usize {
        self.tx.send(order).unwrap_or(0)
    }
}

#[derive(Debug)]
pub enum DispatchOutcome {
    OffTopic,
    Dropped(AgentEventError),
    Ignored { kind: String },
    ImageUpdated,
    OrderBroadcast { receivers: usize },
}

impl DispatchOutcome {
    pub fn mutated_state(&self) -> bool {
        matches!(
            self,
            DispatchOutcome::ImageUpdated | DispatchOutcome::OrderBroadcast { .. }
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct AgentEventDispatcher {
    notifier: OrderNotifier,
}

impl AgentEventDispatcher {
    pub fn new(notifier: OrderNotifier) -> Self {
        Self { notifier }
    }

    pub fn notifier(&self) -> &OrderNotifier {
        &self.notifier
    }

    /// Applies one inbound data packet. Never panics on bad input; anything that
    /// does not decode is logged and dropped.
    pub fn handle(
        &self,
        state: &mut SessionState,
        payload: &[u8],
        topic: Option<&str>,
    ) -> DispatchOutcome {
        if topic != Some(AGENT_EVENTS_TOPIC) {
            return DispatchOutcome::OffTopic;
        }

        let event = match AgentEvent::decode(payload) {
            Ok(Some(event)) => event,
            Ok(None) => {
                let kind = AgentEvent::peek_kind(payload).unwrap_or_default();
                debug!(%kind, "agent event: ignoring unknown type");
                return DispatchOutcome::Ignored { kind };
            }
            Err(error) => {
                warn!(%error, bytes = payload.len(), "agent event: failed to parse payload");
                return DispatchOutcome::Dropped(error);
            }
        };

        match event {
            AgentEvent::Image(preview) => {
                debug!(url = %preview.url, "agent event: image preview");
                state.generated_image = Some(preview);
                DispatchOutcome::ImageUpdated
            }
            AgentEvent::OrderSaved(order) => {
                info!(
                    name = %order.name,
                    drink = %order.headline(),
                    "agent event: order saved"
                );
                let receivers = self.notifier.notify(order);
                DispatchOutcome::OrderBroadcast { receivers }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
