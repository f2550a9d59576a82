use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::{ParticipantIdentity, RoomName};
use tokio::sync::broadcast;

pub mod loopback;
pub mod token;

pub use loopback::{LoopbackConnector, LoopbackRoom};
pub use token::{mint_token, LiveKitConfig, TokenError, TokenGrants};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveKitRoomOptions {
    pub server_url: String,
    pub room_name: RoomName,
    pub identity: ParticipantIdentity,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalTrack {
    Microphone,
    Camera,
    ScreenShare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataPacketKind {
    #[default]
    Reliable,
    Lossy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteParticipant {
    pub identity: ParticipantIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveKitRoomEvent {
    ParticipantJoined(RemoteParticipant),
    ParticipantLeft {
        identity: ParticipantIdentity,
    },
    DataReceived {
        payload: Arc<[u8]>,
        participant: Option<RemoteParticipant>,
        kind: DataPacketKind,
        topic: Option<String>,
    },
    Disconnected,
}

#[async_trait]
pub trait LiveKitRoomSession: Send + Sync {
    fn room_name(&self) -> &RoomName;
    fn local_identity(&self) -> &ParticipantIdentity;
    async fn publish_data(
        &self,
        payload: Vec<u8>,
        topic: Option<&str>,
        kind: DataPacketKind,
    ) -> anyhow::Result<()>;
    async fn publish_local_track(&self, track: LocalTrack) -> anyhow::Result<()>;
    async fn unpublish_local_tracks(&self) -> anyhow::Result<()>;
    async fn leave(&self) -> anyhow::Result<()>;
    fn subscribe_events(&self) -> broadcast::Receiver<LiveKitRoomEvent>;
}

#[async_trait]
pub trait LiveKitRoomConnector: Send + Sync {
    async fn connect(
        &self,
        options: LiveKitRoomOptions,
    ) -> anyhow::Result<Arc<dyn LiveKitRoomSession>>;
}
