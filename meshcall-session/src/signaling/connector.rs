use crate::error::SignalingError;
use async_trait::async_trait;
use meshcall_core::SignalMessage;
use tokio::sync::mpsc;

/// Raw, already-decoded message channel to the relay.
///
/// Dropping `outbound` closes the connection; `inbound` yielding `None` means
/// the relay went away.
pub struct SignalingLink {
    pub outbound: mpsc::UnboundedSender<SignalMessage>,
    pub inbound: mpsc::UnboundedReceiver<SignalMessage>,
}

/// Opens connections to a relay. Implemented over WebSocket by [`crate::WsConnector`].
#[async_trait]
pub trait SignalingConnector: Send + Sync {
    async fn open(&self) -> Result<SignalingLink, SignalingError>;
}
