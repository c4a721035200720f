use anyhow::{Result, bail};
use async_trait::async_trait;
use meshcall_core::{Participant, PeerId, SignalMessage};
use meshcall_session::{SignalingConnector, SignalingError, SignalingLink};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};

/// Timeout for the session to send an expected message (ms).
pub const SCRIPT_TIMEOUT_MS: u64 = 2000;

/// Hands a session one link whose relay side the test drives by hand.
pub struct ScriptedConnector {
    link: Mutex<Option<SignalingLink>>,
}

#[async_trait]
impl SignalingConnector for ScriptedConnector {
    async fn open(&self) -> Result<SignalingLink, SignalingError> {
        self.link
            .lock()
            .await
            .take()
            .ok_or_else(|| SignalingError::Connect("scripted link already used".into()))
    }
}

/// Relay side of a [`ScriptedConnector`].
pub struct ScriptedRelay {
    pub local_peer_id: PeerId,
    to_client: mpsc::UnboundedSender<SignalMessage>,
    from_client: mpsc::UnboundedReceiver<SignalMessage>,
}

/// A connector that welcomes the session as `local_peer_id` and hands it `roster`.
pub fn scripted_relay(
    local_peer_id: &str,
    roster: Vec<Participant>,
) -> (ScriptedConnector, ScriptedRelay) {
    let (to_client, inbound) = mpsc::unbounded_channel::<SignalMessage>();
    let (outbound, from_client) = mpsc::unbounded_channel::<SignalMessage>();
    let local_peer_id = PeerId::from(local_peer_id);

    let _ = to_client.send(SignalMessage::Welcome {
        peer_id: local_peer_id.clone(),
    });
    let _ = to_client.send(SignalMessage::Roster {
        participants: roster,
    });

    let connector = ScriptedConnector {
        link: Mutex::new(Some(SignalingLink { outbound, inbound })),
    };
    let relay = ScriptedRelay {
        local_peer_id,
        to_client,
        from_client,
    };
    (connector, relay)
}

pub fn participant(peer_id: &str) -> Participant {
    Participant::new(PeerId::from(peer_id), format!("user-{peer_id}"), peer_id)
}

impl ScriptedRelay {
    pub fn send(&self, msg: SignalMessage) {
        let _ = self.to_client.send(msg);
    }

    /// Skips client messages until one matches `predicate`.
    pub async fn expect<F>(&mut self, mut predicate: F) -> Result<SignalMessage>
    where
        F: FnMut(&SignalMessage) -> bool,
    {
        let timeout = Duration::from_millis(SCRIPT_TIMEOUT_MS);
        loop {
            match tokio::time::timeout(timeout, self.from_client.recv()).await {
                Ok(Some(msg)) if predicate(&msg) => return Ok(msg),
                Ok(Some(msg)) => tracing::debug!("[ScriptedRelay] skipping {:?}", msg),
                Ok(None) => bail!("Session closed the signaling link"),
                Err(_) => bail!("Timeout waiting for a client message"),
            }
        }
    }

    /// Everything the client has sent and not yet been read.
    pub fn drain(&mut self) -> Vec<SignalMessage> {
        let mut sent = Vec::new();
        while let Ok(msg) = self.from_client.try_recv() {
            sent.push(msg);
        }
        sent
    }
}
