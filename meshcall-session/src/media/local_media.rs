use crate::error::MediaError;
use crate::media::{LocalTrack, MediaDevices};
use std::sync::Arc;
use tracing::{debug, info};

/// Observable local media state. `video_track` is the outbound video source:
/// the screen while sharing, otherwise the camera.
#[derive(Debug, Clone, Default)]
pub struct LocalMediaState {
    pub audio_track: Option<LocalTrack>,
    pub video_track: Option<LocalTrack>,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub screen_sharing: bool,
}

/// Owns the local tracks and decides which video track is outbound.
///
/// Exactly one video source is outbound at a time. While a screen is shared the
/// camera stays parked (live, not stopped) so it can be restored as-is.
pub struct LocalMediaController {
    devices: Arc<dyn MediaDevices>,
    audio: Option<LocalTrack>,
    camera: Option<LocalTrack>,
    screen: Option<LocalTrack>,
}

impl LocalMediaController {
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self {
            devices,
            audio: None,
            camera: None,
            screen: None,
        }
    }

    pub fn devices(&self) -> Arc<dyn MediaDevices> {
        self.devices.clone()
    }

    pub fn is_acquired(&self) -> bool {
        self.audio.is_some() && self.camera.is_some()
    }

    /// Acquires camera and microphone. A refusal is fatal for the caller; nothing is retried.
    pub async fn acquire(&mut self) -> Result<(), MediaError> {
        if self.is_acquired() {
            return Ok(());
        }

        let media = self.devices.open_user_media().await?;
        info!(
            "Local media acquired (audio {}, camera {})",
            media.audio.id(),
            media.camera.id()
        );
        self.audio = Some(media.audio);
        self.camera = Some(media.camera);
        Ok(())
    }

    /// Flips the microphone's `enabled` flag. Returns the new value.
    pub fn toggle_audio(&mut self) -> bool {
        let Some(audio) = &self.audio else {
            return false;
        };
        audio.set_enabled(!audio.is_enabled());
        debug!("Audio enabled: {}", audio.is_enabled());
        audio.is_enabled()
    }

    /// Flips the camera's `enabled` flag. A shared screen is not affected.
    pub fn toggle_video(&mut self) -> bool {
        let Some(camera) = &self.camera else {
            return false;
        };
        camera.set_enabled(!camera.is_enabled());
        debug!("Camera enabled: {}", camera.is_enabled());
        camera.is_enabled()
    }

    pub fn outbound_audio(&self) -> Option<&LocalTrack> {
        self.audio.as_ref()
    }

    pub fn outbound_video(&self) -> Option<&LocalTrack> {
        self.live_screen().or(self.camera.as_ref())
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.live_screen().is_some()
    }

    fn live_screen(&self) -> Option<&LocalTrack> {
        self.screen.as_ref().filter(|screen| !screen.is_ended())
    }

    /// Makes an already captured screen track outbound, parking the camera.
    ///
    /// Returns `None` when the capture ended before it could be used, in which
    /// case the camera stays outbound.
    pub fn activate_screen(&mut self, screen: LocalTrack) -> Option<LocalTrack> {
        if screen.is_ended() {
            debug!("Screen track {} ended before activation", screen.id());
            return None;
        }

        if let Some(previous) = self.screen.replace(screen.clone()) {
            previous.stop();
        }
        info!("Screen share started ({})", screen.id());
        Some(screen)
    }

    /// Stops sharing and restores the parked camera. Returns the restored
    /// outbound track, or `None` if no screen was shared.
    pub fn stop_screen_share(&mut self) -> Option<LocalTrack> {
        let screen = self.screen.take()?;
        screen.stop();
        info!("Screen share stopped ({})", screen.id());
        self.camera.clone()
    }

    /// Applies the stop transition if the screen track ended outside the
    /// application. Returns the restored outbound track when it did.
    pub fn reconcile_screen(&mut self) -> Option<LocalTrack> {
        if self.screen.as_ref().is_some_and(|screen| screen.is_ended()) {
            return self.stop_screen_share();
        }
        None
    }

    /// Whether `track_id` is the screen currently held by the controller.
    pub fn holds_screen(&self, track_id: &str) -> bool {
        self.screen.as_ref().is_some_and(|screen| screen.id() == track_id)
    }

    pub fn state(&self) -> LocalMediaState {
        LocalMediaState {
            audio_track: self.audio.clone(),
            video_track: self.outbound_video().cloned(),
            audio_enabled: self.audio.as_ref().is_some_and(|t| t.is_enabled()),
            video_enabled: self.camera.as_ref().is_some_and(|t| t.is_enabled()),
            screen_sharing: self.is_screen_sharing(),
        }
    }

    /// Stops every track. The controller can be re-acquired afterwards.
    pub fn release(&mut self) {
        for track in [self.audio.take(), self.camera.take(), self.screen.take()]
            .into_iter()
            .flatten()
        {
            track.stop();
        }
        info!("Local media released");
    }
}
