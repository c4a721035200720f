use crate::error::{SessionError, SessionResult};
use crate::session::session_command::SessionCommand;
use crate::session::{SessionEvent, SessionSnapshot};
use meshcall_core::{PeerId, RoomId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::warn;

pub type SessionEvents = mpsc::UnboundedReceiver<SessionEvent>;

/// Caller-side control of a running session.
pub struct SessionHandle {
    room_id: RoomId,
    local_peer_id: PeerId,
    commands: mpsc::Sender<SessionCommand>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub(crate) fn new(
        room_id: RoomId,
        local_peer_id: PeerId,
        commands: mpsc::Sender<SessionCommand>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            room_id,
            local_peer_id,
            commands,
            task,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn local_peer_id(&self) -> &PeerId {
        &self.local_peer_id
    }

    /// Mutes or unmutes the microphone in place. Returns whether audio is now enabled.
    pub async fn toggle_audio(&self) -> SessionResult<bool> {
        self.request(|reply| SessionCommand::ToggleAudio { reply })
            .await
    }

    /// Enables or disables the camera in place. Returns whether the camera is now enabled.
    pub async fn toggle_video(&self) -> SessionResult<bool> {
        self.request(|reply| SessionCommand::ToggleVideo { reply })
            .await
    }

    /// Opens the screen picker and, once a screen is chosen, sends it instead of
    /// the camera on every link.
    pub async fn start_screen_share(&self) -> SessionResult<()> {
        self.request(|reply| SessionCommand::StartScreenShare { reply })
            .await?
    }

    /// Returns `false` if no screen was being shared.
    pub async fn stop_screen_share(&self) -> SessionResult<bool> {
        self.request(|reply| SessionCommand::StopScreenShare { reply })
            .await
    }

    /// Tears down whatever link exists to `peer_id` and negotiates a fresh one as offerer.
    pub async fn restart_peer(&self, peer_id: PeerId) -> SessionResult<()> {
        self.request(|reply| SessionCommand::RestartPeer { peer_id, reply })
            .await?
    }

    pub async fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        self.request(|reply| SessionCommand::Snapshot { reply })
            .await
    }

    /// Releases local media, closes every link and disconnects from the relay.
    /// Resolves once every transport has been closed.
    pub async fn leave(self) -> SessionResult<()> {
        let result = self
            .request(|reply| SessionCommand::Leave { reply })
            .await;

        if let Err(e) = self.task.await {
            warn!("Session task ended abnormally: {}", e);
        }
        result
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> SessionResult<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}
