use crate::media::LocalTrack;
use crate::peer::link_driver::{LinkCommand, LinkTracks, run_link};
use crate::transport::{LinkKey, RemoteTrack, TransportEvents, TransportFactory};
use meshcall_core::{IceCandidate, IceServerConfig, PeerId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Progress of one PeerLink. A link that fails is removed from the session
/// right away and reported as `SessionEvent::PeerFailed`, so there is no
/// resting failed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    Negotiating,
    Connected,
    Closed,
}

/// Which side of the offer/answer exchange the local peer plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Offerer,
    Answerer,
}

/// Remote media received over one link.
#[derive(Debug, Clone, Default)]
pub struct RemoteStream {
    pub tracks: Vec<RemoteTrack>,
}

/// Session-side record of the connection to one remote peer.
///
/// The transport itself lives in a driver task; the record keeps the negotiation
/// bookkeeping the session loop needs and forwards steps to the driver.
pub struct PeerLink {
    key: LinkKey,
    role: NegotiationRole,
    state: NegotiationState,
    commands: mpsc::UnboundedSender<LinkCommand>,
    task: Option<JoinHandle<()>>,
    remote_stream: RemoteStream,
    description_sent: bool,
    outbound_candidates: Vec<IceCandidate>,
}

impl PeerLink {
    pub(crate) fn spawn(
        key: LinkKey,
        role: NegotiationRole,
        factory: Arc<dyn TransportFactory>,
        ice_servers: Vec<IceServerConfig>,
        tracks: LinkTracks,
        events: TransportEvents,
    ) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_link(factory, ice_servers, tracks, events, command_rx));
        debug!(
            "Spawned link #{} to {} as {:?}",
            key.link_id, key.peer_id, role
        );

        Self {
            key,
            role,
            state: NegotiationState::Idle,
            commands,
            task: Some(task),
            remote_stream: RemoteStream::default(),
            description_sent: false,
            outbound_candidates: Vec::new(),
        }
    }

    pub fn key(&self) -> &LinkKey {
        &self.key
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.key.peer_id
    }

    pub fn role(&self) -> NegotiationRole {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn remote_stream(&self) -> &RemoteStream {
        &self.remote_stream
    }

    pub(crate) fn set_state(&mut self, state: NegotiationState) -> bool {
        let changed = self.state != state;
        self.state = state;
        changed
    }

    pub(crate) fn offer(&mut self) {
        self.state = NegotiationState::Negotiating;
        self.command(LinkCommand::CreateOffer);
    }

    pub(crate) fn accept_offer(&mut self, sdp: String) {
        if self.state != NegotiationState::Connected {
            self.state = NegotiationState::Negotiating;
        }
        self.command(LinkCommand::AcceptOffer(sdp));
    }

    pub(crate) fn apply_answer(&mut self, sdp: String) {
        self.command(LinkCommand::ApplyAnswer(sdp));
    }

    pub(crate) fn add_remote_candidate(&mut self, candidate: IceCandidate) {
        self.command(LinkCommand::AddCandidate(candidate));
    }

    pub(crate) fn replace_video_track(&mut self, track: LocalTrack) {
        self.command(LinkCommand::ReplaceVideoTrack(track));
    }

    /// Returns the candidate if it may go out now. Candidates discovered before
    /// our offer/answer has been sent are held so the peer never sees them first.
    pub(crate) fn queue_local_candidate(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        if self.description_sent {
            Some(candidate)
        } else {
            self.outbound_candidates.push(candidate);
            None
        }
    }

    /// Marks our description as sent and releases the held candidates.
    pub(crate) fn description_sent(&mut self) -> Vec<IceCandidate> {
        self.description_sent = true;
        std::mem::take(&mut self.outbound_candidates)
    }

    pub(crate) fn add_remote_track(&mut self, track: RemoteTrack) {
        self.remote_stream.tracks.retain(|t| t.id != track.id);
        self.remote_stream.tracks.push(track);
    }

    /// Tears the link down. The returned handle completes once the transport is closed.
    pub(crate) fn close(mut self) -> Option<JoinHandle<()>> {
        self.state = NegotiationState::Closed;
        self.command(LinkCommand::Close);
        self.task.take()
    }

    fn command(&self, command: LinkCommand) {
        if self.commands.send(command).is_err() {
            debug!("Link #{} to {} already stopped", self.key.link_id, self.key.peer_id);
        }
    }
}

impl Drop for PeerLink {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.commands.send(LinkCommand::Close);
        }
    }
}
