use crate::media::LocalTrack;
use crate::peer::candidate_queue::CandidateQueue;
use crate::transport::{PeerTransport, SessionDescription, TransportEvents, TransportFactory};
use anyhow::Result;
use meshcall_core::{IceCandidate, IceServerConfig};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub(crate) enum LinkCommand {
    CreateOffer,
    AcceptOffer(String),
    ApplyAnswer(String),
    AddCandidate(IceCandidate),
    ReplaceVideoTrack(LocalTrack),
    Close,
}

/// Outbound tracks attached when the transport is created.
#[derive(Debug, Clone, Default)]
pub(crate) struct LinkTracks {
    pub(crate) audio: Option<LocalTrack>,
    pub(crate) video: Option<LocalTrack>,
}

/// Owns one transport and executes negotiation steps for it strictly in order.
struct LinkDriver {
    events: TransportEvents,
    transport: Box<dyn PeerTransport>,
    candidates: CandidateQueue,
}

impl LinkDriver {
    async fn handle(&mut self, command: LinkCommand) -> Result<()> {
        match command {
            LinkCommand::CreateOffer => {
                let sdp = self.transport.create_offer().await?;
                self.events
                    .description(SessionDescription::offer(sdp))
                    .await;
            }
            LinkCommand::AcceptOffer(sdp) => {
                self.transport
                    .set_remote_description(SessionDescription::offer(sdp))
                    .await?;
                self.flush_candidates().await;
                let answer = self.transport.create_answer().await?;
                self.events
                    .description(SessionDescription::answer(answer))
                    .await;
            }
            LinkCommand::ApplyAnswer(sdp) => {
                self.transport
                    .set_remote_description(SessionDescription::answer(sdp))
                    .await?;
                self.flush_candidates().await;
            }
            LinkCommand::AddCandidate(candidate) => {
                match self.candidates.push(candidate) {
                    Some(candidate) => self.apply_candidate(candidate).await,
                    None => debug!(
                        "Queued early candidate from {} ({} pending)",
                        self.events.key().peer_id,
                        self.candidates.len()
                    ),
                }
            }
            LinkCommand::ReplaceVideoTrack(track) => {
                if let Err(e) = self.transport.replace_video_track(&track).await {
                    warn!(
                        "Failed to switch video toward {}: {:#}",
                        self.events.key().peer_id,
                        e
                    );
                }
            }
            LinkCommand::Close => {}
        }
        Ok(())
    }

    async fn flush_candidates(&mut self) {
        for candidate in self.candidates.remote_description_applied() {
            self.apply_candidate(candidate).await;
        }
    }

    async fn apply_candidate(&mut self, candidate: IceCandidate) {
        if let Err(e) = self.transport.add_ice_candidate(candidate).await {
            warn!(
                "Rejected candidate from {}: {:#}",
                self.events.key().peer_id,
                e
            );
        }
    }
}

/// Task body of a PeerLink. Runs until `Close`, a failed negotiation step,
/// or the session dropping the command channel; the transport is closed on exit.
pub(crate) async fn run_link(
    factory: Arc<dyn TransportFactory>,
    ice_servers: Vec<IceServerConfig>,
    tracks: LinkTracks,
    events: TransportEvents,
    mut commands: mpsc::UnboundedReceiver<LinkCommand>,
) {
    let peer_id = events.key().peer_id.clone();

    let transport = match factory.create(&ice_servers, events.clone()).await {
        Ok(transport) => transport,
        Err(e) => {
            warn!("Failed to create transport for {}: {:#}", peer_id, e);
            events.failed(format!("{e:#}")).await;
            return;
        }
    };

    let mut driver = LinkDriver {
        events,
        transport,
        candidates: CandidateQueue::default(),
    };

    match driver
        .transport
        .attach_tracks(tracks.audio.as_ref(), tracks.video.as_ref())
        .await
    {
        Ok(()) => {
            while let Some(command) = commands.recv().await {
                if matches!(command, LinkCommand::Close) {
                    break;
                }
                if let Err(e) = driver.handle(command).await {
                    warn!("Negotiation with {} failed: {:#}", peer_id, e);
                    driver.events.failed(format!("{e:#}")).await;
                    break;
                }
            }
        }
        Err(e) => {
            warn!("Failed to attach tracks for {}: {:#}", peer_id, e);
            driver.events.failed(format!("{e:#}")).await;
        }
    }

    if let Err(e) = driver.transport.close().await {
        warn!("Error closing transport for {}: {:#}", peer_id, e);
    }
    info!("Link to {} closed", peer_id);
}
