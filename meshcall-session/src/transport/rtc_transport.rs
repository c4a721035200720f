use crate::media::{LocalTrack, TrackKind};
use crate::transport::{
    LinkKey, PeerTransport, RemoteTrack, SdpKind, SessionDescription, TransportEvents,
    TransportFactory, TransportState,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use meshcall_core::{IceCandidate, IceServerConfig};
use std::sync::Arc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

/// Builds webrtc-rs peer connections.
#[derive(Debug, Default, Clone)]
pub struct RtcTransportFactory;

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: TransportEvents,
    ) -> Result<Box<dyn PeerTransport>> {
        Ok(Box::new(RtcTransport::new(ice_servers, events).await?))
    }
}

pub struct RtcTransport {
    key: LinkKey,
    peer_connection: Arc<RTCPeerConnection>,
    video_sender: Option<Arc<RTCRtpSender>>,
}

impl RtcTransport {
    pub async fn new(ice_servers: &[IceServerConfig], events: TransportEvents) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let key = events.key().clone();

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let events = state_events.clone();

                Box::pin(async move {
                    info!(
                        "Peer connection state changed for {}: {:?}",
                        events.key().peer_id,
                        s
                    );
                    let state = match s {
                        RTCPeerConnectionState::New | RTCPeerConnectionState::Unspecified => {
                            TransportState::New
                        }
                        RTCPeerConnectionState::Connecting => TransportState::Connecting,
                        RTCPeerConnectionState::Connected => TransportState::Connected,
                        RTCPeerConnectionState::Disconnected => TransportState::Disconnected,
                        RTCPeerConnectionState::Failed => TransportState::Failed,
                        RTCPeerConnectionState::Closed => TransportState::Closed,
                    };
                    events.state(state).await;
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                events
                    .candidate(IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_m_line_index: init.sdp_mline_index,
                        username_fragment: init.username_fragment,
                    })
                    .await;
            })
        }));

        let track_events = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        _ => TrackKind::Video,
                    };
                    debug!(
                        "Remote {:?} track '{}' from {}",
                        kind,
                        track.id(),
                        events.key().peer_id
                    );
                    events
                        .track(RemoteTrack {
                            id: track.id(),
                            kind,
                            stream_id: track.stream_id(),
                            rtp: Some(track),
                        })
                        .await;
                })
            },
        ));

        Ok(Self {
            key,
            peer_connection,
            video_sender: None,
        })
    }

    async fn add_track(&self, track: &LocalTrack) -> Result<Arc<RTCRtpSender>> {
        let sender = self
            .peer_connection
            .add_track(track.rtp_track())
            .await
            .with_context(|| format!("Failed to add track {}", track.id()))?;

        // RTCP has to be drained for the interceptors to run.
        let rtcp_sender = sender.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while rtcp_sender.read(&mut buf).await.is_ok() {}
        });

        Ok(sender)
    }
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn attach_tracks(
        &mut self,
        audio: Option<&LocalTrack>,
        video: Option<&LocalTrack>,
    ) -> Result<()> {
        if let Some(audio) = audio {
            self.add_track(audio).await?;
        }
        if let Some(video) = video {
            self.video_sender = Some(self.add_track(video).await?);
        }
        Ok(())
    }

    async fn create_offer(&mut self) -> Result<String> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn create_answer(&mut self) -> Result<String> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn set_remote_description(&mut self, description: SessionDescription) -> Result<()> {
        let desc = match description.kind {
            SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&mut self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn replace_video_track(&mut self, track: &LocalTrack) -> Result<()> {
        match &self.video_sender {
            Some(sender) => sender
                .replace_track(Some(track.rtp_track()))
                .await
                .context("Failed to replace outbound video")?,
            None => {
                debug!(
                    "No video sender toward {}; ignoring track {}",
                    self.key.peer_id,
                    track.id()
                );
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
