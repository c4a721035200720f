use crate::media::TrackKind;
use meshcall_core::{IceCandidate, PeerId};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_remote::TrackRemote;

/// Identifies one incarnation of a PeerLink. A new link toward the same peer
/// gets a new `link_id`, which is how late events from a torn-down link are told apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkKey {
    pub peer_id: PeerId,
    pub link_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Inbound media from a remote peer.
#[derive(Clone)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
    pub stream_id: String,
    /// RTP source for rendering; absent for transports that carry no real media.
    pub rtp: Option<Arc<TrackRemote>>,
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("stream_id", &self.stream_id)
            .finish()
    }
}

/// Everything a PeerLink reports back to the session loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// A local offer/answer is ready to be sent to the peer.
    DescriptionReady(LinkKey, SessionDescription),

    /// Trickle ICE: a local candidate was discovered.
    CandidateGenerated(LinkKey, IceCandidate),

    StateChanged(LinkKey, TransportState),

    TrackAdded(LinkKey, RemoteTrack),

    /// A negotiation step failed; the link cannot continue.
    NegotiationFailed(LinkKey, String),
}

impl TransportEvent {
    pub fn key(&self) -> &LinkKey {
        match self {
            TransportEvent::DescriptionReady(key, _)
            | TransportEvent::CandidateGenerated(key, _)
            | TransportEvent::StateChanged(key, _)
            | TransportEvent::TrackAdded(key, _)
            | TransportEvent::NegotiationFailed(key, _) => key,
        }
    }
}

/// Sender handed to a transport, pre-tagged with its link.
#[derive(Clone)]
pub struct TransportEvents {
    key: LinkKey,
    tx: mpsc::Sender<TransportEvent>,
}

impl TransportEvents {
    pub fn new(key: LinkKey, tx: mpsc::Sender<TransportEvent>) -> Self {
        Self { key, tx }
    }

    pub fn key(&self) -> &LinkKey {
        &self.key
    }

    pub async fn candidate(&self, candidate: IceCandidate) {
        self.emit(TransportEvent::CandidateGenerated(self.key.clone(), candidate))
            .await;
    }

    pub async fn state(&self, state: TransportState) {
        self.emit(TransportEvent::StateChanged(self.key.clone(), state))
            .await;
    }

    pub async fn track(&self, track: RemoteTrack) {
        self.emit(TransportEvent::TrackAdded(self.key.clone(), track))
            .await;
    }

    pub(crate) async fn description(&self, description: SessionDescription) {
        self.emit(TransportEvent::DescriptionReady(self.key.clone(), description))
            .await;
    }

    pub(crate) async fn failed(&self, reason: String) {
        self.emit(TransportEvent::NegotiationFailed(self.key.clone(), reason))
            .await;
    }

    async fn emit(&self, event: TransportEvent) {
        // The session stops listening once it has left; late events are moot.
        let _ = self.tx.send(event).await;
    }
}
