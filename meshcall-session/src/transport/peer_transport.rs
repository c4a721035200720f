use crate::media::LocalTrack;
use crate::transport::{SessionDescription, TransportEvents};
use anyhow::Result;
use async_trait::async_trait;
use meshcall_core::{IceCandidate, IceServerConfig};

/// One negotiated media connection to a remote peer.
///
/// Implementations report discovered candidates, state changes and inbound
/// tracks through the [`TransportEvents`] they were created with.
#[async_trait]
pub trait PeerTransport: Send {
    /// Attaches the outbound tracks before the first offer/answer.
    async fn attach_tracks(
        &mut self,
        audio: Option<&LocalTrack>,
        video: Option<&LocalTrack>,
    ) -> Result<()>;

    /// Creates an offer and applies it as the local description.
    async fn create_offer(&mut self) -> Result<String>;

    /// Creates an answer to the applied remote offer and applies it locally.
    async fn create_answer(&mut self) -> Result<String>;

    async fn set_remote_description(&mut self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&mut self, candidate: IceCandidate) -> Result<()>;

    /// Swaps the outgoing video in place, without a new offer/answer round.
    async fn replace_video_track(&mut self, track: &LocalTrack) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: TransportEvents,
    ) -> Result<Box<dyn PeerTransport>>;
}
