//! In-process room backend.
//!
//! Every participant connected through the same [`LoopbackConnector`] with the
//! same room name sees the others' data packets in publish order. There is no
//! media; track publication is only recorded.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use shared::domain::{ParticipantIdentity, RoomName};
use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    DataPacketKind, LiveKitRoomConnector, LiveKitRoomEvent, LiveKitRoomOptions,
    LiveKitRoomSession, LocalTrack, RemoteParticipant,
};

const ROOM_EVENT_CAPACITY: usize = 64;

#[derive(Default)]
struct Hub {
    participants: Mutex<HashMap<ParticipantIdentity, broadcast::Sender<LiveKitRoomEvent>>>,
}

impl Hub {
    fn fan_out(&self, from: &ParticipantIdentity, event: LiveKitRoomEvent) -> anyhow::Result<()> {
        let participants = self
            .participants
            .lock()
            .map_err(|_| anyhow!("loopback room registry poisoned"))?;
        for (identity, tx) in participants.iter() {
            if identity != from {
                // A participant with no live subscriber simply misses the event.
                let _ = tx.send(event.clone());
            }
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct LoopbackConnector {
    rooms: Arc<Mutex<HashMap<RoomName, Arc<Hub>>>>,
}

impl LoopbackConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(
        &self,
        room_name: impl Into<RoomName>,
        identity: impl Into<ParticipantIdentity>,
    ) -> anyhow::Result<Arc<LoopbackRoom>> {
        let room_name = room_name.into();
        let identity = identity.into();

        let hub = {
            let mut rooms = self
                .rooms
                .lock()
                .map_err(|_| anyhow!("loopback room map poisoned"))?;
            Arc::clone(rooms.entry(room_name.clone()).or_default())
        };

        let (events, _) = broadcast::channel(ROOM_EVENT_CAPACITY);
        {
            let mut participants = hub
                .participants
                .lock()
                .map_err(|_| anyhow!("loopback room registry poisoned"))?;
            if participants.contains_key(&identity) {
                bail!("participant '{identity}' is already in room '{room_name}'");
            }
            participants.insert(identity.clone(), events.clone());
        }

        hub.fan_out(
            &identity,
            LiveKitRoomEvent::ParticipantJoined(RemoteParticipant {
                identity: identity.clone(),
            }),
        )?;
        debug!(room = %room_name, %identity, "loopback: participant joined");

        Ok(Arc::new(LoopbackRoom {
            hub,
            room_name,
            identity,
            events,
            tracks: Mutex::new(Vec::new()),
            left: AtomicBool::new(false),
        }))
    }
}

#[async_trait]
impl LiveKitRoomConnector for LoopbackConnector {
    async fn connect(
        &self,
        options: LiveKitRoomOptions,
    ) -> anyhow::Result<Arc<dyn LiveKitRoomSession>> {
        let room: Arc<dyn LiveKitRoomSession> =
            self.join(options.room_name, options.identity).await?;
        Ok(room)
    }
}

pub struct LoopbackRoom {
    hub: Arc<Hub>,
    room_name: RoomName,
    identity: ParticipantIdentity,
    events: broadcast::Sender<LiveKitRoomEvent>,
    tracks: Mutex<Vec<LocalTrack>>,
    left: AtomicBool,
}

impl LoopbackRoom {
    pub fn published_tracks(&self) -> Vec<LocalTrack> {
        self.tracks
            .lock()
            .map(|tracks| tracks.clone())
            .unwrap_or_default()
    }

    fn ensure_connected(&self) -> anyhow::Result<()> {
        if self.left.load(Ordering::SeqCst) {
            bail!("participant '{}' has left the room", self.identity);
        }
        Ok(())
    }
}

#[async_trait]
impl LiveKitRoomSession for LoopbackRoom {
    fn room_name(&self) -> &RoomName {
        &self.room_name
    }

    fn local_identity(&self) -> &ParticipantIdentity {
        &self.identity
    }

    async fn publish_data(
        &self,
        payload: Vec<u8>,
        topic: Option<&str>,
        kind: DataPacketKind,
    ) -> anyhow::Result<()> {
        self.ensure_connected()?;
        self.hub.fan_out(
            &self.identity,
            LiveKitRoomEvent::DataReceived {
                payload: payload.into(),
                participant: Some(RemoteParticipant {
                    identity: self.identity.clone(),
                }),
                kind,
                topic: topic.map(str::to_string),
            },
        )
    }

    async fn publish_local_track(&self, track: LocalTrack) -> anyhow::Result<()> {
        self.ensure_connected()?;
        let mut tracks = self
            .tracks
            .lock()
            .map_err(|_| anyhow!("loopback track list poisoned"))?;
        if !tracks.contains(&track) {
            tracks.push(track);
        }
        Ok(())
    }

    async fn unpublish_local_tracks(&self) -> anyhow::Result<()> {
        self.tracks
            .lock()
            .map_err(|_| anyhow!("loopback track list poisoned"))?
            .clear();
        Ok(())
    }

    async fn leave(&self) -> anyhow::Result<()> {
        if self.left.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.hub
            .participants
            .lock()
            .map_err(|_| anyhow!("loopback room registry poisoned"))?
            .remove(&self.identity);
        self.hub.fan_out(
            &self.identity,
            LiveKitRoomEvent::ParticipantLeft {
                identity: self.identity.clone(),
            },
        )?;
        let _ = self.events.send(LiveKitRoomEvent::Disconnected);
        debug!(room = %self.room_name, identity = %self.identity, "loopback: participant left");
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<LiveKitRoomEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn data_reaches_other_participants_only() {
        let connector = LoopbackConnector::new();
        let agent = connector.join("cafe", "agent").await.expect("agent");
        let user = connector.join("cafe", "user").await.expect("user");
        let mut agent_events = agent.subscribe_events();
        let mut user_events = user.subscribe_events();

        agent
            .publish_data(b"hi".to_vec(), Some("agent_events"), DataPacketKind::Reliable)
            .await
            .expect("publish");

        match user_events.recv().await.expect("event") {
            LiveKitRoomEvent::DataReceived {
                payload,
                participant,
                topic,
                kind,
            } => {
                assert_eq!(&*payload, b"hi");
                assert_eq!(participant.expect("sender").identity.as_str(), "agent");
                assert_eq!(topic.as_deref(), Some("agent_events"));
                assert_eq!(kind, DataPacketKind::Reliable);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(agent_events.try_recv().is_err());
    }

    #[tokio::test]
    async fn rooms_are_isolated_by_name() {
        let connector = LoopbackConnector::new();
        let a = connector.join("one", "agent").await.expect("agent");
        let b = connector.join("two", "user").await.expect("user");
        let mut b_events = b.subscribe_events();

        a.publish_data(b"x".to_vec(), None, DataPacketKind::Lossy)
            .await
            .expect("publish");
        assert!(b_events.try_recv().is_err());
    }

    #[tokio::test]
    async fn leave_notifies_peers_and_blocks_publishing() {
        let connector = LoopbackConnector::new();
        let agent = connector.join("cafe", "agent").await.expect("agent");
        let user = connector.join("cafe", "user").await.expect("user");
        let mut agent_events = agent.subscribe_events();
        let mut user_events = user.subscribe_events();

        user.leave().await.expect("leave");

        assert_eq!(
            agent_events.recv().await.expect("left"),
            LiveKitRoomEvent::ParticipantLeft {
                identity: "user".into()
            }
        );
        assert_eq!(
            user_events.recv().await.expect("disconnected"),
            LiveKitRoomEvent::Disconnected
        );
        assert!(user
            .publish_data(Vec::new(), None, DataPacketKind::Reliable)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn duplicate_identity_is_rejected() {
        let connector = LoopbackConnector::new();
        let _first = connector.join("cafe", "user").await.expect("first");
        assert!(connector.join("cafe", "user").await.is_err());
    }

    #[tokio::test]
    async fn tracks_are_recorded_once() {
        let connector = LoopbackConnector::new();
        let room = connector.join("cafe", "user").await.expect("user");
        room.publish_local_track(LocalTrack::Microphone)
            .await
            .expect("mic");
        room.publish_local_track(LocalTrack::Microphone)
            .await
            .expect("mic again");
        assert_eq!(room.published_tracks(), vec![LocalTrack::Microphone]);

        room.unpublish_local_tracks().await.expect("unpublish");
        assert!(room.published_tracks().is_empty());
    }
}
