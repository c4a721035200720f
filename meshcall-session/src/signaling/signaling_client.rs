use crate::error::SignalingError;
use crate::signaling::{SignalingConnector, SignalingEvents};
use meshcall_core::{IceServerConfig, NegotiationPayload, PeerId, RoomId, SignalMessage};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Sending half of the relay connection, scoped to one room and one local identity.
pub struct SignalingClient {
    room_id: RoomId,
    local_peer_id: PeerId,
    relay_ice_servers: Option<Vec<IceServerConfig>>,
    outbound: Option<mpsc::UnboundedSender<SignalMessage>>,
}

impl SignalingClient {
    /// Opens the channel, waits for the relay to assign our peer id and emits `join`.
    pub async fn connect(
        connector: &dyn SignalingConnector,
        room_id: RoomId,
        user_id: &str,
        display_name: &str,
        handshake_timeout: Duration,
    ) -> Result<(Self, SignalingEvents), SignalingError> {
        let link = connector.open().await?;
        let mut inbound = link.inbound;
        let mut buffered = VecDeque::new();
        let mut relay_ice_servers = None;

        let handshake = async {
            loop {
                match inbound.recv().await {
                    Some(SignalMessage::Welcome { peer_id }) => return Ok(peer_id),
                    Some(SignalMessage::IceConfig { ice_servers }) => {
                        debug!("Relay supplied {} ICE servers", ice_servers.len());
                        relay_ice_servers = Some(ice_servers);
                    }
                    Some(msg @ (SignalMessage::Join { .. } | SignalMessage::Leave { .. })) => {
                        return Err(SignalingError::Protocol(format!("{msg:?}")));
                    }
                    Some(other) => buffered.push_back(other),
                    None => return Err(SignalingError::Closed),
                }
            }
        };

        let local_peer_id = tokio::time::timeout(handshake_timeout, handshake)
            .await
            .map_err(|_| SignalingError::HandshakeTimeout)??;

        info!("Relay assigned peer id {} in room {}", local_peer_id, room_id);

        let client = Self {
            room_id: room_id.clone(),
            local_peer_id: local_peer_id.clone(),
            relay_ice_servers,
            outbound: Some(link.outbound),
        };

        client.send(SignalMessage::Join {
            room_id,
            user_id: user_id.to_owned(),
            display_name: display_name.to_owned(),
        })?;

        Ok((client, SignalingEvents::new(local_peer_id, buffered, inbound)))
    }

    pub fn local_peer_id(&self) -> &PeerId {
        &self.local_peer_id
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// ICE servers pushed by the relay during the handshake, if any.
    pub fn relay_ice_servers(&self) -> Option<&[IceServerConfig]> {
        self.relay_ice_servers.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.outbound.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub fn send(&self, msg: SignalMessage) -> Result<(), SignalingError> {
        let Some(outbound) = &self.outbound else {
            return Err(SignalingError::Closed);
        };
        outbound.send(msg).map_err(|_| SignalingError::Closed)
    }

    /// Sends a negotiation message from the local identity to `to`.
    pub fn send_to(&self, to: &PeerId, payload: NegotiationPayload) -> Result<(), SignalingError> {
        self.send(SignalMessage::negotiation(
            self.local_peer_id.clone(),
            to.clone(),
            payload,
        ))
    }

    /// Announces the exit and closes the channel.
    pub fn leave(&mut self) {
        let leave = SignalMessage::Leave {
            room_id: self.room_id.clone(),
        };
        if let Err(e) = self.send(leave) {
            warn!("Could not announce leave: {}", e);
        }
        self.disconnect();
    }

    pub fn disconnect(&mut self) {
        if self.outbound.take().is_some() {
            info!("Signaling channel for {} closed locally", self.local_peer_id);
        }
    }
}
