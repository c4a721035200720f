use crate::model::participant::Participant;
use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// A trickled network path candidate, in the browser's `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

/// Wire messages exchanged with the relay.
///
/// Negotiation variants (`Offer`, `Answer`, `IceCandidate`) are relayed verbatim
/// between `from` and `to`; everything else is produced or consumed by the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum SignalMessage {
    Welcome {
        peer_id: PeerId,
    },
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    Join {
        room_id: RoomId,
        user_id: String,
        display_name: String,
    },
    Roster {
        participants: Vec<Participant>,
    },
    PeerJoined {
        peer_id: PeerId,
        user_id: String,
        display_name: String,
    },
    Offer {
        from: PeerId,
        to: PeerId,
        sdp: String,
    },
    Answer {
        from: PeerId,
        to: PeerId,
        sdp: String,
    },
    IceCandidate {
        from: PeerId,
        to: PeerId,
        candidate: IceCandidate,
    },
    PeerLeft {
        peer_id: PeerId,
    },
    Leave {
        room_id: RoomId,
    },
}

/// The addressed part of a negotiation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationPayload {
    Offer(String),
    Answer(String),
    IceCandidate(IceCandidate),
}

impl SignalMessage {
    pub fn negotiation(from: PeerId, to: PeerId, payload: NegotiationPayload) -> Self {
        match payload {
            NegotiationPayload::Offer(sdp) => Self::Offer { from, to, sdp },
            NegotiationPayload::Answer(sdp) => Self::Answer { from, to, sdp },
            NegotiationPayload::IceCandidate(candidate) => Self::IceCandidate {
                from,
                to,
                candidate,
            },
        }
    }

    /// Recipient of a relayed message, `None` for relay-level messages.
    pub fn target(&self) -> Option<&PeerId> {
        match self {
            Self::Offer { to, .. } | Self::Answer { to, .. } | Self::IceCandidate { to, .. } => {
                Some(to)
            }
            _ => None,
        }
    }

    /// Claimed sender of a relayed message.
    pub fn sender(&self) -> Option<&PeerId> {
        match self {
            Self::Offer { from, .. }
            | Self::Answer { from, .. }
            | Self::IceCandidate { from, .. } => Some(from),
            _ => None,
        }
    }

    pub fn is_negotiation(&self) -> bool {
        self.target().is_some()
    }

    pub fn peer_joined(participant: Participant) -> Self {
        Self::PeerJoined {
            peer_id: participant.peer_id,
            user_id: participant.user_id,
            display_name: participant.display_name,
        }
    }
}
