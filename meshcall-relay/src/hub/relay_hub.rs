use dashmap::DashMap;
use meshcall_core::{IceServerConfig, Participant, PeerId, RoomId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct PeerEntry {
    tx: mpsc::UnboundedSender<SignalMessage>,
    room: Option<RoomId>,
}

struct HubInner {
    peers: DashMap<PeerId, PeerEntry>,
    rooms: DashMap<RoomId, Vec<Participant>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Room membership and message forwarding for connected clients.
///
/// The hub never looks inside offers, answers or candidates; it only checks
/// that sender and target share a room. A room's roster and its `peer-joined` /
/// `peer-left` broadcasts are produced under the room's lock, so two clients
/// joining at once always see each other exactly once.
#[derive(Clone)]
pub struct RelayHub {
    inner: Arc<HubInner>,
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RelayHub {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(HubInner {
                peers: DashMap::new(),
                rooms: DashMap::new(),
                ice_servers,
            }),
        }
    }

    /// Registers a client connection and greets it with its peer id.
    pub fn attach(&self, tx: mpsc::UnboundedSender<SignalMessage>) -> PeerId {
        let peer_id = PeerId::new();

        if !self.inner.ice_servers.is_empty() {
            let _ = tx.send(SignalMessage::IceConfig {
                ice_servers: self.inner.ice_servers.clone(),
            });
        }
        let _ = tx.send(SignalMessage::Welcome {
            peer_id: peer_id.clone(),
        });

        self.inner
            .peers
            .insert(peer_id.clone(), PeerEntry { tx, room: None });
        info!("Peer {} attached", peer_id);
        peer_id
    }

    /// Drops a client, announcing `peer-left` to its room.
    pub fn detach(&self, peer_id: &PeerId) {
        self.leave_room(peer_id);
        if self.inner.peers.remove(peer_id).is_some() {
            info!("Peer {} detached", peer_id);
        }
    }

    pub fn handle(&self, peer_id: &PeerId, msg: SignalMessage) {
        match msg {
            SignalMessage::Join {
                room_id,
                user_id,
                display_name,
            } => {
                let participant = Participant::new(peer_id.clone(), user_id, display_name);
                self.join(room_id, participant);
            }

            SignalMessage::Leave { room_id } => {
                if self.room_of(peer_id).as_ref() == Some(&room_id) {
                    self.leave_room(peer_id);
                } else {
                    debug!("Peer {} is not in room {}", peer_id, room_id);
                }
            }

            msg if msg.is_negotiation() => self.forward(peer_id, msg),

            other => warn!("Unexpected message from client {}: {:?}", peer_id, other),
        }
    }

    pub fn room_members(&self, room_id: &RoomId) -> Vec<Participant> {
        self.inner
            .rooms
            .get(room_id)
            .map(|members| members.value().clone())
            .unwrap_or_default()
    }

    pub fn room_of(&self, peer_id: &PeerId) -> Option<RoomId> {
        self.inner
            .peers
            .get(peer_id)
            .and_then(|entry| entry.room.clone())
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }

    fn join(&self, room_id: RoomId, participant: Participant) {
        let peer_id = participant.peer_id.clone();
        if !self.inner.peers.contains_key(&peer_id) {
            warn!("Join from unknown peer {}", peer_id);
            return;
        }
        self.leave_room(&peer_id);

        let mut members = self.inner.rooms.entry(room_id.clone()).or_default();

        self.send(
            &peer_id,
            SignalMessage::Roster {
                participants: members.value().clone(),
            },
        );
        for member in members.iter() {
            self.send(&member.peer_id, SignalMessage::peer_joined(participant.clone()));
        }
        if let Some(mut entry) = self.inner.peers.get_mut(&peer_id) {
            entry.room = Some(room_id.clone());
        }

        info!(
            "Peer {} joined room {} ({} already present)",
            peer_id,
            room_id,
            members.len()
        );
        members.push(participant);
    }

    fn leave_room(&self, peer_id: &PeerId) {
        let room_id = self
            .inner
            .peers
            .get_mut(peer_id)
            .and_then(|mut entry| entry.room.take());
        let Some(room_id) = room_id else {
            return;
        };

        let remaining = {
            let Some(mut members) = self.inner.rooms.get_mut(&room_id) else {
                return;
            };
            members.retain(|member| &member.peer_id != peer_id);
            for member in members.iter() {
                self.send(
                    &member.peer_id,
                    SignalMessage::PeerLeft {
                        peer_id: peer_id.clone(),
                    },
                );
            }
            members.len()
        };

        info!("Peer {} left room {}", peer_id, room_id);
        if remaining == 0 {
            self.inner
                .rooms
                .remove_if(&room_id, |_, members| members.is_empty());
            debug!("Room {} is empty and was dropped", room_id);
        }
    }

    fn forward(&self, from: &PeerId, msg: SignalMessage) {
        let (Some(sender), Some(target)) = (msg.sender(), msg.target()) else {
            return;
        };
        if sender != from {
            warn!("Peer {} sent a message claiming to be {}", from, sender);
            return;
        }

        let from_room = self.room_of(from);
        if from_room.is_none() || from_room != self.room_of(target) {
            debug!("Dropping message from {} to {}: not in the same room", from, target);
            return;
        }

        let target = target.clone();
        self.send(&target, msg);
    }

    fn send(&self, peer_id: &PeerId, msg: SignalMessage) {
        let Some(entry) = self.inner.peers.get(peer_id) else {
            warn!("Attempted to send signal to disconnected peer {}", peer_id);
            return;
        };
        if entry.tx.send(msg).is_err() {
            debug!("Connection to {} is closing", peer_id);
        }
    }
}
