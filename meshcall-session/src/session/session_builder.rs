use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::media::{LocalMediaController, MediaDevices, SampleDevices};
use crate::session::{Session, SessionEvents, SessionHandle};
use crate::signaling::{SignalingClient, SignalingConnector};
use crate::transport::{RtcTransportFactory, TransportFactory};
use meshcall_core::RoomId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Assembles a session and joins a room.
///
/// ```no_run
/// # use meshcall_session::{SessionBuilder, WsConnector};
/// # use std::sync::Arc;
/// # async fn run() -> Result<(), meshcall_session::SessionError> {
/// let (session, mut events) = SessionBuilder::new(Arc::new(WsConnector::new("ws://127.0.0.1:8080/ws")))
///     .join("r1", "u-42", "Ada")
///     .await?;
/// while let Some(event) = events.recv().await {
///     println!("{event:?}");
/// }
/// session.leave().await
/// # }
/// ```
pub struct SessionBuilder {
    config: SessionConfig,
    connector: Arc<dyn SignalingConnector>,
    devices: Arc<dyn MediaDevices>,
    transports: Arc<dyn TransportFactory>,
}

impl SessionBuilder {
    pub fn new(connector: Arc<dyn SignalingConnector>) -> Self {
        Self {
            config: SessionConfig::default(),
            connector,
            devices: Arc::new(SampleDevices::default()),
            transports: Arc::new(RtcTransportFactory),
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn devices(mut self, devices: Arc<dyn MediaDevices>) -> Self {
        self.devices = devices;
        self
    }

    pub fn transports(mut self, transports: Arc<dyn TransportFactory>) -> Self {
        self.transports = transports;
        self
    }

    /// Acquires local media, connects to the relay and starts the session loop.
    ///
    /// Fails with `MediaAccessDenied` or `SignalingDisconnected`; in both cases
    /// nothing is left running.
    pub async fn join(
        self,
        room_id: impl Into<RoomId>,
        user_id: &str,
        display_name: &str,
    ) -> SessionResult<(SessionHandle, SessionEvents)> {
        let room_id = room_id.into();

        let mut media = LocalMediaController::new(self.devices);
        media
            .acquire()
            .await
            .map_err(SessionError::MediaAccessDenied)?;

        let connected = SignalingClient::connect(
            self.connector.as_ref(),
            room_id.clone(),
            user_id,
            display_name,
            self.config.handshake_timeout,
        )
        .await;
        let (signaling, signaling_events) = match connected {
            Ok(connected) => connected,
            Err(e) => {
                media.release();
                return Err(SessionError::SignalingDisconnected(e));
            }
        };

        let transport_event_capacity = self.config.transport_event_capacity();
        let ice_servers = signaling
            .relay_ice_servers()
            .map(<[_]>::to_vec)
            .unwrap_or(self.config.ice_servers);
        let local_peer_id = signaling.local_peer_id().clone();
        info!("Joined room {} as {}", room_id, local_peer_id);

        let (command_tx, command_rx) = mpsc::channel(100);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let session = Session::new(
            signaling,
            signaling_events,
            media,
            self.transports,
            ice_servers,
            transport_event_capacity,
            command_rx,
            event_tx,
        );
        let task = tokio::spawn(session.run());

        Ok((
            SessionHandle::new(room_id, local_peer_id, command_tx, task),
            event_rx,
        ))
    }
}
