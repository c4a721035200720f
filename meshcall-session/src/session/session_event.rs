use crate::transport::RemoteTrack;
use meshcall_core::{Participant, PeerId};

/// Notifications for the embedding UI.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    ParticipantJoined(Participant),
    ParticipantLeft(PeerId),
    PeerConnected(PeerId),
    /// The link to this peer failed and was removed. See [`crate::SessionHandle::restart_peer`].
    PeerFailed { peer_id: PeerId, reason: String },
    RemoteTrackAdded { peer_id: PeerId, track: RemoteTrack },
    RemoteStreamRemoved(PeerId),
    /// Screen sharing ended from outside the application; the camera is outbound again.
    ScreenShareEnded,
    /// The relay channel closed. Existing links keep running; nothing reconnects.
    SignalingDisconnected,
}
