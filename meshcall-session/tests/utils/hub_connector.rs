use async_trait::async_trait;
use meshcall_core::{PeerId, SignalMessage};
use meshcall_relay::RelayHub;
use meshcall_session::{SignalingConnector, SignalingError, SignalingLink};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Connects sessions straight to an in-process [`RelayHub`] and journals
/// everything each client sends.
#[derive(Clone, Default)]
pub struct HubConnector {
    hub: RelayHub,
    journal: Arc<Mutex<Vec<(PeerId, SignalMessage)>>>,
}

impl HubConnector {
    pub fn new(hub: RelayHub) -> Self {
        Self {
            hub,
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn hub(&self) -> &RelayHub {
        &self.hub
    }

    /// Every message `peer_id` has sent so far, in order.
    pub async fn sent_by(&self, peer_id: &PeerId) -> Vec<SignalMessage> {
        self.journal
            .lock()
            .await
            .iter()
            .filter(|(from, _)| from == peer_id)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    /// Offers `from` sent to `to`.
    pub async fn offers(&self, from: &PeerId, to: &PeerId) -> usize {
        self.sent_by(from)
            .await
            .iter()
            .filter(|msg| matches!(msg, SignalMessage::Offer { to: target, .. } if target == to))
            .count()
    }

    /// Offer, answer and ice-candidate messages across all clients.
    pub async fn negotiation_count(&self) -> usize {
        self.journal
            .lock()
            .await
            .iter()
            .filter(|(_, msg)| msg.is_negotiation())
            .count()
    }
}

#[async_trait]
impl SignalingConnector for HubConnector {
    async fn open(&self) -> Result<SignalingLink, SignalingError> {
        let (to_client, inbound) = mpsc::unbounded_channel();
        let peer_id = self.hub.attach(to_client);
        let (outbound, mut from_client) = mpsc::unbounded_channel::<SignalMessage>();

        let hub = self.hub.clone();
        let journal = self.journal.clone();
        tokio::spawn(async move {
            while let Some(msg) = from_client.recv().await {
                journal.lock().await.push((peer_id.clone(), msg.clone()));
                hub.handle(&peer_id, msg);
            }
            hub.detach(&peer_id);
        });

        Ok(SignalingLink { outbound, inbound })
    }
}

/// A relay that cannot be reached.
pub struct UnreachableConnector;

#[async_trait]
impl SignalingConnector for UnreachableConnector {
    async fn open(&self) -> Result<SignalingLink, SignalingError> {
        Err(SignalingError::Connect("connection refused".into()))
    }
}
