use crate::error::{MediaError, SessionResult};
use crate::media::LocalTrack;
use crate::session::SessionSnapshot;
use meshcall_core::PeerId;
use tokio::sync::oneshot;

/// Requests from a [`crate::SessionHandle`] to the session loop.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    ToggleAudio { reply: oneshot::Sender<bool> },
    ToggleVideo { reply: oneshot::Sender<bool> },
    StartScreenShare { reply: oneshot::Sender<SessionResult<()>> },
    StopScreenShare { reply: oneshot::Sender<bool> },
    RestartPeer {
        peer_id: PeerId,
        reply: oneshot::Sender<SessionResult<()>>,
    },
    Snapshot { reply: oneshot::Sender<SessionSnapshot> },
    Leave { reply: oneshot::Sender<()> },
}

/// Results of media work done off the session loop.
#[derive(Debug)]
pub(crate) enum MediaEvent {
    DisplayMediaReady {
        result: Result<LocalTrack, MediaError>,
        reply: oneshot::Sender<SessionResult<()>>,
    },
    /// A shared screen ended outside the application.
    ScreenEnded(String),
}
