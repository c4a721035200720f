use crate::media::LocalMediaState;
use crate::peer::{NegotiationRole, NegotiationState};
use crate::transport::RemoteTrack;
use meshcall_core::{Participant, PeerId, RoomId};

#[derive(Debug, Clone)]
pub struct PeerLinkSnapshot {
    pub peer_id: PeerId,
    pub role: NegotiationRole,
    pub state: NegotiationState,
    pub remote_tracks: Vec<RemoteTrack>,
}

/// Point-in-time view of a session. Lists are ordered by peer id.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub room_id: RoomId,
    pub local_peer_id: PeerId,
    pub participants: Vec<Participant>,
    pub links: Vec<PeerLinkSnapshot>,
    pub media: LocalMediaState,
    pub signaling_connected: bool,
}

impl SessionSnapshot {
    pub fn link(&self, peer_id: &PeerId) -> Option<&PeerLinkSnapshot> {
        self.links.iter().find(|link| &link.peer_id == peer_id)
    }
}
