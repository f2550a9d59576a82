//! Session container: owns the room handle, listens for data packets and keeps
//! the view state the session screen renders from.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use livekit_integration::{
    DataPacketKind, LiveKitRoomConnector, LiveKitRoomEvent, LiveKitRoomOptions,
    LiveKitRoomSession, LocalTrack,
};
use shared::{
    config::AppConfig,
    domain::{ImagePreview, ParticipantIdentity},
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, RwLock},
    task::{AbortHandle, JoinHandle},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dispatcher::{AgentEventDispatcher, DispatchOutcome, SessionState},
    receipt::OrderReceipt,
    transcript::{ChatMessage, ChatOrigin, ChatWireMessage, CHAT_TOPIC},
    views::{ControlBarControls, SessionChrome},
};

const SESSION_UPDATE_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to connect to room: {0}")]
    Connect(String),
    #[error("failed to publish local track: {0}")]
    PublishTrack(String),
    #[error("{0:?} is disabled for this deployment")]
    ControlDisabled(LocalTrack),
    #[error("chat input is disabled for this deployment")]
    ChatDisabled,
    #[error("failed to send chat message: {0}")]
    Chat(String),
}

/// Emitted after the session state changed, so a renderer knows to redraw.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    ImageChanged(Option<ImagePreview>),
    TranscriptChanged,
    ChatVisibilityChanged(bool),
    ParticipantsChanged(Vec<ParticipantIdentity>),
    Disconnected,
}

/// Keeps the room listener registered. Dropping it de-registers the listener.
pub struct ListenerGuard {
    task: Option<JoinHandle<()>>,
}

impl ListenerGuard {
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn detach(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.abort();
    }
}

pub struct SessionView {
    room: Arc<dyn LiveKitRoomSession>,
    config: AppConfig,
    state: RwLock<SessionState>,
    dispatcher: AgentEventDispatcher,
    updates: broadcast::Sender<SessionUpdate>,
    listener: Mutex<Option<AbortHandle>>,
}

impl SessionView {
    pub fn new(room: Arc<dyn LiveKitRoomSession>, config: AppConfig) -> Arc<Self> {
        let (updates, _) = broadcast::channel(SESSION_UPDATE_CAPACITY);
        Arc::new(Self {
            room,
            config,
            state: RwLock::new(SessionState::default()),
            dispatcher: AgentEventDispatcher::default(),
            updates,
            listener: Mutex::new(None),
        })
    }

    /// Connects to the room and publishes the microphone.
    pub async fn start(
        connector: &dyn LiveKitRoomConnector,
        options: LiveKitRoomOptions,
        config: AppConfig,
    ) -> Result<Arc<Self>, SessionError> {
        let room_name = options.room_name.clone();
        let room = connector
            .connect(options)
            .await
            .map_err(|err| SessionError::Connect(err.to_string()))?;

        room.publish_local_track(LocalTrack::Microphone)
            .await
            .map_err(|err| SessionError::PublishTrack(err.to_string()))?;

        info!(room = %room_name, identity = %room.local_identity(), "session: connected");
        Ok(Self::new(room, config))
    }

    /// Registers the data listener; it stays registered while the guard lives.
    /// A session owns at most one listener: attaching again stops the previous
    /// one, so each packet is applied once.
    pub fn attach(self: &Arc<Self>) -> ListenerGuard {
        let mut listener = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = listener.take() {
            debug!("session: replacing room listener");
            previous.abort();
        }

        let mut events = self.room.subscribe_events();
        let session = Arc::clone(self);
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => session.apply(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session: room listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("session: room listener stopped");
        });
        *listener = Some(task.abort_handle());
        ListenerGuard { task: Some(task) }
    }

    /// Applies a single room event to the session state.
    pub async fn apply(&self, event: LiveKitRoomEvent) {
        match event {
            LiveKitRoomEvent::DataReceived {
                payload,
                participant,
                topic,
                ..
            } => {
                if topic.as_deref() == Some(CHAT_TOPIC) {
                    let from = participant
                        .map(|p| p.identity)
                        .unwrap_or_else(|| ParticipantIdentity::from("unknown"));
                    self.receive_chat(&payload, from).await;
                    return;
                }

                let (outcome, image) = {
                    let mut state = self.state.write().await;
                    let outcome = self.dispatcher.handle(&mut state, &payload, topic.as_deref());
                    (outcome, state.generated_image.clone())
                };
                if let DispatchOutcome::ImageUpdated = outcome {
                    self.emit(SessionUpdate::ImageChanged(image));
                }
            }
            LiveKitRoomEvent::ParticipantJoined(participant) => {
                let participants = {
                    let mut state = self.state.write().await;
                    if !state.remote_participants.contains(&participant.identity) {
                        state.remote_participants.push(participant.identity);
                    }
                    state.remote_participants.clone()
                };
                self.emit(SessionUpdate::ParticipantsChanged(participants));
            }
            LiveKitRoomEvent::ParticipantLeft { identity } => {
                let participants = {
                    let mut state = self.state.write().await;
                    state.remote_participants.retain(|p| p != &identity);
                    state.remote_participants.clone()
                };
                self.emit(SessionUpdate::ParticipantsChanged(participants));
            }
            LiveKitRoomEvent::Disconnected => self.emit(SessionUpdate::Disconnected),
        }
    }

    async fn receive_chat(&self, payload: &[u8], from: ParticipantIdentity) {
        let wire: ChatWireMessage = match serde_json::from_slice(payload) {
            Ok(wire) => wire,
            Err(error) => {
                warn!(%error, "session: dropping malformed chat message");
                return;
            }
        };
        self.state.write().await.transcript.push(ChatMessage {
            id: wire.id,
            timestamp: wire.timestamp,
            message: wire.message,
            from: ChatOrigin::Remote(from),
        });
        self.emit(SessionUpdate::TranscriptChanged);
    }

    fn emit(&self, update: SessionUpdate) {
        // Nobody rendering is fine.
        let _ = self.updates.send(update);
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    pub fn order_receipt(&self) -> OrderReceipt {
        OrderReceipt::new(self.dispatcher.notifier().subscribe())
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn room(&self) -> &Arc<dyn LiveKitRoomSession> {
        &self.room
    }

    pub fn controls(&self) -> ControlBarControls {
        ControlBarControls::from_config(&self.config)
    }

    pub fn chrome(&self) -> SessionChrome {
        SessionChrome::from_config(&self.config)
    }

    /// Closes the image viewer.
    pub async fn dismiss_image(&self) {
        let changed = self.state.write().await.generated_image.take().is_some();
        if changed {
            self.emit(SessionUpdate::ImageChanged(None));
        }
    }

    pub async fn set_chat_open(&self, open: bool) {
        let changed = {
            let mut state = self.state.write().await;
            let changed = state.chat_open != open;
            state.chat_open = open;
            changed
        };
        if changed {
            self.emit(SessionUpdate::ChatVisibilityChanged(open));
        }
    }

    pub async fn send_chat(&self, text: &str) -> Result<ChatMessage, SessionError> {
        if !self.config.supports_chat_input {
            return Err(SessionError::ChatDisabled);
        }

        let wire = ChatWireMessage {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            message: text.to_string(),
        };
        let payload =
            serde_json::to_vec(&wire).map_err(|err| SessionError::Chat(err.to_string()))?;
        self.room
            .publish_data(payload, Some(CHAT_TOPIC), DataPacketKind::Reliable)
            .await
            .map_err(|err| SessionError::Chat(err.to_string()))?;

        let message = ChatMessage {
            id: wire.id,
            timestamp: wire.timestamp,
            message: wire.message,
            from: ChatOrigin::Local,
        };
        self.state.write().await.transcript.push(message.clone());
        self.emit(SessionUpdate::TranscriptChanged);
        Ok(message)
    }

    pub async fn enable_track(&self, track: LocalTrack) -> Result<(), SessionError> {
        let controls = self.controls();
        let allowed = match track {
            LocalTrack::Microphone => controls.microphone,
            LocalTrack::Camera => controls.camera,
            LocalTrack::ScreenShare => controls.screen_share,
        };
        if !allowed {
            return Err(SessionError::ControlDisabled(track));
        }
        self.room
            .publish_local_track(track)
            .await
            .map_err(|err| SessionError::PublishTrack(err.to_string()))
    }

    pub async fn leave(&self) -> anyhow::Result<()> {
        let _ = self.room.unpublish_local_tracks().await;
        self.room.leave().await?;
        info!(room = %self.room.room_name(), "session: left room");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
