use meshcall_core::{IceCandidate, Participant, PeerId, SignalMessage};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Inbound signaling, one variant per handler the session reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    Roster(Vec<Participant>),
    PeerJoined(Participant),
    Offer { from: PeerId, sdp: String },
    Answer { from: PeerId, sdp: String },
    IceCandidate { from: PeerId, candidate: IceCandidate },
    PeerLeft(PeerId),
    /// The relay channel closed. Delivered once; no reconnect is attempted.
    Disconnected,
}

/// Receiving half of a connected [`crate::SignalingClient`].
pub struct SignalingEvents {
    local_peer_id: PeerId,
    buffered: VecDeque<SignalMessage>,
    inbound: mpsc::UnboundedReceiver<SignalMessage>,
    disconnected: bool,
}

impl SignalingEvents {
    pub(crate) fn new(
        local_peer_id: PeerId,
        buffered: VecDeque<SignalMessage>,
        inbound: mpsc::UnboundedReceiver<SignalMessage>,
    ) -> Self {
        Self {
            local_peer_id,
            buffered,
            inbound,
            disconnected: false,
        }
    }

    /// Next event in arrival order. Returns `Disconnected` once when the
    /// channel closes and `None` afterwards.
    pub async fn recv(&mut self) -> Option<SignalingEvent> {
        loop {
            if self.disconnected {
                return None;
            }

            let msg = match self.buffered.pop_front() {
                Some(msg) => msg,
                None => match self.inbound.recv().await {
                    Some(msg) => msg,
                    None => {
                        self.disconnected = true;
                        return Some(SignalingEvent::Disconnected);
                    }
                },
            };

            if let Some(event) = self.translate(msg) {
                return Some(event);
            }
        }
    }

    fn translate(&self, msg: SignalMessage) -> Option<SignalingEvent> {
        if let Some(to) = msg.target() {
            if *to != self.local_peer_id {
                warn!("Dropping negotiation message addressed to {}", to);
                return None;
            }
        }

        match msg {
            SignalMessage::Roster { participants } => Some(SignalingEvent::Roster(participants)),
            SignalMessage::PeerJoined {
                peer_id,
                user_id,
                display_name,
            } => Some(SignalingEvent::PeerJoined(Participant {
                peer_id,
                user_id,
                display_name,
            })),
            SignalMessage::Offer { from, sdp, .. } => Some(SignalingEvent::Offer { from, sdp }),
            SignalMessage::Answer { from, sdp, .. } => Some(SignalingEvent::Answer { from, sdp }),
            SignalMessage::IceCandidate {
                from, candidate, ..
            } => Some(SignalingEvent::IceCandidate { from, candidate }),
            SignalMessage::PeerLeft { peer_id } => Some(SignalingEvent::PeerLeft(peer_id)),
            other => {
                debug!("Ignoring relay message outside the session contract: {:?}", other);
                None
            }
        }
    }
}
