use meshcall_core::PeerId;
use thiserror::Error;

/// Failures surfaced by the session to its caller.
///
/// Only `MediaAccessDenied` and `SignalingDisconnected` abort a `join`;
/// the rest are scoped to one peer or one user action.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("local media unavailable: {0}")]
    MediaAccessDenied(#[source] MediaError),

    #[error("signaling relay unreachable: {0}")]
    SignalingDisconnected(#[source] SignalingError),

    #[error("negotiation with {peer_id} failed: {reason}")]
    NegotiationFailed { peer_id: PeerId, reason: String },

    #[error("screen share denied")]
    ScreenShareDenied,

    #[error("session is closed")]
    Closed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("permission denied for {0}")]
    PermissionDenied(&'static str),

    #[error("no {0} device available")]
    DeviceNotFound(&'static str),

    #[error("screen capture cancelled")]
    ScreenCaptureCancelled,
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("failed to connect to relay: {0}")]
    Connect(String),

    #[error("relay did not complete the handshake in time")]
    HandshakeTimeout,

    #[error("signaling channel closed")]
    Closed,

    #[error("unexpected message from relay: {0}")]
    Protocol(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
