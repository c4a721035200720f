use crate::error::MediaError;
use crate::media::LocalTrack;
use async_trait::async_trait;

/// Microphone and camera acquired together at join time.
#[derive(Debug, Clone)]
pub struct UserMedia {
    pub audio: LocalTrack,
    pub camera: LocalTrack,
}

/// Capture backend the local media controller draws tracks from.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Requests camera and microphone access.
    async fn open_user_media(&self) -> Result<UserMedia, MediaError>;

    /// Shows the screen picker. `ScreenCaptureCancelled` when the user dismisses it.
    async fn open_display_media(&self) -> Result<LocalTrack, MediaError>;
}
