use crate::error::{SessionError, SessionResult};
use crate::media::{LocalMediaController, LocalTrack};
use crate::peer::{LinkTracks, NegotiationRole, NegotiationState, PeerLink};
use crate::session::session_command::{MediaEvent, SessionCommand};
use crate::session::{PeerLinkSnapshot, SessionEvent, SessionSnapshot};
use crate::signaling::{SignalingClient, SignalingEvent, SignalingEvents};
use crate::transport::{
    LinkKey, SdpKind, TransportEvent, TransportEvents, TransportFactory, TransportState,
};
use meshcall_core::{IceCandidate, IceServerConfig, NegotiationPayload, Participant, PeerId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The running call: owns local media, the signaling client and the PeerLink
/// registry, and is the only place any of them is mutated.
pub struct Session {
    signaling: SignalingClient,
    signaling_events: SignalingEvents,
    signaling_open: bool,
    media: LocalMediaController,
    transports: Arc<dyn TransportFactory>,
    ice_servers: Vec<IceServerConfig>,
    participants: HashMap<PeerId, Participant>,
    links: HashMap<PeerId, PeerLink>,
    next_link_id: u64,
    screen_request_pending: bool,
    command_rx: mpsc::Receiver<SessionCommand>,
    transport_tx: mpsc::Sender<TransportEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    media_tx: mpsc::UnboundedSender<MediaEvent>,
    media_rx: mpsc::UnboundedReceiver<MediaEvent>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        signaling: SignalingClient,
        signaling_events: SignalingEvents,
        media: LocalMediaController,
        transports: Arc<dyn TransportFactory>,
        ice_servers: Vec<IceServerConfig>,
        transport_event_buffer: usize,
        command_rx: mpsc::Receiver<SessionCommand>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::channel(transport_event_buffer);
        let (media_tx, media_rx) = mpsc::unbounded_channel();

        Self {
            signaling,
            signaling_events,
            signaling_open: true,
            media,
            transports,
            ice_servers,
            participants: HashMap::new(),
            links: HashMap::new(),
            next_link_id: 0,
            screen_request_pending: false,
            command_rx,
            transport_tx,
            transport_rx,
            media_tx,
            media_rx,
            events,
        }
    }

    fn local_peer_id(&self) -> &PeerId {
        self.signaling.local_peer_id()
    }

    pub async fn run(mut self) {
        info!(
            "Session event loop started for {} in room {}",
            self.local_peer_id(),
            self.signaling.room_id()
        );

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Leave { reply }) => {
                            self.shutdown().await;
                            let _ = reply.send(());
                            break;
                        }
                        Some(c) => self.handle_command(c),
                        None => {
                            info!("All session handles dropped. Leaving.");
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                evt = self.signaling_events.recv(), if self.signaling_open => {
                    match evt {
                        Some(e) => self.handle_signal(e),
                        None => self.signaling_open = false,
                    }
                }

                Some(evt) = self.transport_rx.recv() => {
                    self.handle_transport_event(evt);
                }

                Some(evt) = self.media_rx.recv() => {
                    self.handle_media_event(evt);
                }
            }
        }

        info!("Session event loop finished");
    }

    fn handle_command(&mut self, cmd: SessionCommand) {
        self.reconcile_screen();

        match cmd {
            SessionCommand::ToggleAudio { reply } => {
                let _ = reply.send(self.media.toggle_audio());
            }

            SessionCommand::ToggleVideo { reply } => {
                let _ = reply.send(self.media.toggle_video());
            }

            SessionCommand::StartScreenShare { reply } => {
                if self.media.is_screen_sharing() {
                    let _ = reply.send(Ok(()));
                    return;
                }
                if self.screen_request_pending {
                    debug!("Screen picker already open");
                    let _ = reply.send(Err(SessionError::ScreenShareDenied));
                    return;
                }

                // The picker can stay open indefinitely; keep serving peers meanwhile.
                self.screen_request_pending = true;
                let devices = self.media.devices();
                let media_tx = self.media_tx.clone();
                tokio::spawn(async move {
                    let result = devices.open_display_media().await;
                    let _ = media_tx.send(MediaEvent::DisplayMediaReady { result, reply });
                });
            }

            SessionCommand::StopScreenShare { reply } => {
                let restored = self.media.stop_screen_share();
                let stopped = restored.is_some();
                if let Some(camera) = restored {
                    self.fan_out_video(camera);
                }
                let _ = reply.send(stopped);
            }

            SessionCommand::RestartPeer { peer_id, reply } => {
                let _ = reply.send(self.restart_peer(peer_id));
            }

            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }

            SessionCommand::Leave { .. } => {}
        }
    }

    fn handle_signal(&mut self, event: SignalingEvent) {
        match event {
            SignalingEvent::Roster(participants) => {
                info!("Roster received with {} participants", participants.len());
                for participant in participants {
                    if &participant.peer_id == self.local_peer_id() {
                        continue;
                    }
                    let peer_id = participant.peer_id.clone();
                    self.add_participant(participant);

                    if self.links.contains_key(&peer_id) {
                        debug!("Already linked to {}", peer_id);
                        continue;
                    }
                    self.open_link(peer_id, NegotiationRole::Offerer).offer();
                }
            }

            SignalingEvent::PeerJoined(participant) => {
                if &participant.peer_id == self.local_peer_id() {
                    return;
                }
                info!(
                    "Peer {} ({}) joined; waiting for their offer",
                    participant.peer_id, participant.display_name
                );
                self.add_participant(participant);
            }

            SignalingEvent::Offer { from, sdp } => self.handle_offer(from, sdp),

            SignalingEvent::Answer { from, sdp } => match self.links.get_mut(&from) {
                Some(link) if link.role() == NegotiationRole::Offerer => link.apply_answer(sdp),
                Some(_) => warn!("Ignoring answer from {}: we are not the offerer", from),
                None => debug!("Ignoring answer from unknown peer {}", from),
            },

            SignalingEvent::IceCandidate { from, candidate } => match self.links.get_mut(&from) {
                Some(link) => link.add_remote_candidate(candidate),
                None => debug!("Ignoring candidate from unknown peer {}", from),
            },

            SignalingEvent::PeerLeft(peer_id) => {
                info!("Peer {} left", peer_id);
                self.remove_link(&peer_id);
                if self.participants.remove(&peer_id).is_some() {
                    self.emit(SessionEvent::ParticipantLeft(peer_id));
                }
            }

            SignalingEvent::Disconnected => {
                warn!("Signaling channel disconnected");
                self.signaling_open = false;
                self.signaling.disconnect();
                self.emit(SessionEvent::SignalingDisconnected);
            }
        }
    }

    fn handle_offer(&mut self, from: PeerId, sdp: String) {
        if let Some(link) = self.links.get_mut(&from) {
            let glare = link.role() == NegotiationRole::Offerer
                && link.state() == NegotiationState::Negotiating;

            if !glare {
                debug!("Renegotiation offer from {}", from);
                link.accept_offer(sdp);
                return;
            }

            if self.signaling.local_peer_id() > &from {
                debug!("Offer collision with {}; keeping our offer", from);
                return;
            }

            info!("Offer collision with {}; yielding", from);
            self.remove_link(&from);
        } else if !self.participants.contains_key(&from) {
            debug!("Ignoring offer from {}: not in the room", from);
            return;
        }

        self.open_link(from, NegotiationRole::Answerer)
            .accept_offer(sdp);
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        let key = event.key().clone();
        let Some(link) = self
            .links
            .get_mut(&key.peer_id)
            .filter(|link| link.key() == &key)
        else {
            debug!(
                "Dropping stale event from link #{} to {}",
                key.link_id, key.peer_id
            );
            return;
        };

        match event {
            TransportEvent::DescriptionReady(_, description) => {
                let payload = match description.kind {
                    SdpKind::Offer => NegotiationPayload::Offer(description.sdp),
                    SdpKind::Answer => NegotiationPayload::Answer(description.sdp),
                };
                if let Err(e) = self.signaling.send_to(&key.peer_id, payload) {
                    warn!("Could not send description to {}: {}", key.peer_id, e);
                    return;
                }
                for candidate in link.description_sent() {
                    send_candidate(&self.signaling, &key.peer_id, candidate);
                }
            }

            TransportEvent::CandidateGenerated(_, candidate) => {
                if let Some(candidate) = link.queue_local_candidate(candidate) {
                    send_candidate(&self.signaling, &key.peer_id, candidate);
                }
            }

            TransportEvent::StateChanged(_, state) => match state {
                TransportState::Connected => {
                    if link.set_state(NegotiationState::Connected) {
                        info!("Connected to {}", key.peer_id);
                        self.emit(SessionEvent::PeerConnected(key.peer_id));
                    }
                }
                TransportState::Failed => {
                    self.fail_link(&key.peer_id, "transport failed".to_owned());
                }
                other => debug!("Link to {} is {:?}", key.peer_id, other),
            },

            TransportEvent::TrackAdded(_, track) => {
                info!("Remote {:?} track from {}", track.kind, key.peer_id);
                link.add_remote_track(track.clone());
                self.emit(SessionEvent::RemoteTrackAdded {
                    peer_id: key.peer_id,
                    track,
                });
            }

            TransportEvent::NegotiationFailed(_, reason) => {
                self.fail_link(&key.peer_id, reason);
            }
        }
    }

    fn handle_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::DisplayMediaReady { result, reply } => {
                self.screen_request_pending = false;

                let screen = match result {
                    Ok(track) => self.media.activate_screen(track),
                    Err(e) => {
                        info!("Screen share not started: {}", e);
                        None
                    }
                };

                let Some(screen) = screen else {
                    let _ = reply.send(Err(SessionError::ScreenShareDenied));
                    return;
                };

                self.watch_screen(&screen);
                self.fan_out_video(screen);
                let _ = reply.send(Ok(()));
            }

            MediaEvent::ScreenEnded(track_id) => {
                if self.media.holds_screen(&track_id) {
                    self.reconcile_screen();
                }
            }
        }
    }

    fn watch_screen(&self, screen: &LocalTrack) {
        let screen = screen.clone();
        let media_tx = self.media_tx.clone();
        tokio::spawn(async move {
            screen.ended().await;
            let _ = media_tx.send(MediaEvent::ScreenEnded(screen.id().to_owned()));
        });
    }

    /// Applies an externally ended screen share before anything can observe it.
    fn reconcile_screen(&mut self) {
        if let Some(camera) = self.media.reconcile_screen() {
            info!("Screen share ended outside the application");
            self.fan_out_video(camera);
            self.emit(SessionEvent::ScreenShareEnded);
        }
    }

    fn fan_out_video(&mut self, track: LocalTrack) {
        debug!(
            "Switching outbound video to {} on {} links",
            track.id(),
            self.links.len()
        );
        for link in self.links.values_mut() {
            link.replace_video_track(track.clone());
        }
    }

    fn restart_peer(&mut self, peer_id: PeerId) -> SessionResult<()> {
        if !self.participants.contains_key(&peer_id) {
            return Err(SessionError::NegotiationFailed {
                peer_id,
                reason: "not in the room".to_owned(),
            });
        }

        info!("Restarting negotiation with {}", peer_id);
        self.remove_link(&peer_id);
        self.open_link(peer_id, NegotiationRole::Offerer).offer();
        Ok(())
    }

    fn add_participant(&mut self, participant: Participant) {
        let replaced = self
            .participants
            .insert(participant.peer_id.clone(), participant.clone());
        if replaced.is_none() {
            self.emit(SessionEvent::ParticipantJoined(participant));
        }
    }

    fn open_link(&mut self, peer_id: PeerId, role: NegotiationRole) -> &mut PeerLink {
        self.next_link_id += 1;
        let key = LinkKey {
            peer_id: peer_id.clone(),
            link_id: self.next_link_id,
        };
        let tracks = LinkTracks {
            audio: self.media.outbound_audio().cloned(),
            video: self.media.outbound_video().cloned(),
        };
        let link = PeerLink::spawn(
            key.clone(),
            role,
            self.transports.clone(),
            self.ice_servers.clone(),
            tracks,
            TransportEvents::new(key, self.transport_tx.clone()),
        );

        self.links.entry(peer_id).insert_entry(link).into_mut()
    }

    /// Closes and forgets the link. Safe to call for peers without one.
    fn remove_link(&mut self, peer_id: &PeerId) {
        let Some(link) = self.links.remove(peer_id) else {
            return;
        };
        let had_stream = !link.remote_stream().tracks.is_empty();
        drop(link.close());
        if had_stream {
            self.emit(SessionEvent::RemoteStreamRemoved(peer_id.clone()));
        }
    }

    fn fail_link(&mut self, peer_id: &PeerId, reason: String) {
        error!("Link to {} failed: {}", peer_id, reason);
        self.remove_link(peer_id);
        self.emit(SessionEvent::PeerFailed {
            peer_id: peer_id.clone(),
            reason,
        });
    }

    fn snapshot(&self) -> SessionSnapshot {
        let mut participants: Vec<_> = self.participants.values().cloned().collect();
        participants.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));

        let mut links: Vec<_> = self
            .links
            .values()
            .map(|link| PeerLinkSnapshot {
                peer_id: link.peer_id().clone(),
                role: link.role(),
                state: link.state(),
                remote_tracks: link.remote_stream().tracks.clone(),
            })
            .collect();
        links.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));

        SessionSnapshot {
            room_id: self.signaling.room_id().clone(),
            local_peer_id: self.local_peer_id().clone(),
            participants,
            links,
            media: self.media.state(),
            signaling_connected: self.signaling.is_connected(),
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    async fn shutdown(&mut self) {
        info!("Leaving room {}", self.signaling.room_id());

        // Drivers must never block on a full channel nobody reads anymore.
        self.transport_rx.close();
        self.media.release();

        let tasks: Vec<_> = self
            .links
            .drain()
            .filter_map(|(_, link)| link.close())
            .collect();
        self.signaling.leave();

        for task in tasks {
            if let Err(e) = task.await {
                warn!("Link task ended abnormally: {}", e);
            }
        }
        self.participants.clear();
        info!("Session released");
    }
}

fn send_candidate(signaling: &SignalingClient, peer_id: &PeerId, candidate: IceCandidate) {
    if let Err(e) = signaling.send_to(peer_id, NegotiationPayload::IceCandidate(candidate)) {
        debug!("Could not send candidate to {}: {}", peer_id, e);
    }
}
