use crate::config::{DeviceAccess, MediaConfig};
use crate::error::MediaError;
use crate::media::{LocalTrack, MediaDevices, TrackSource, UserMedia};
use async_trait::async_trait;
use tracing::{debug, warn};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;

/// Devices backed by sample tracks that an external capture pipeline writes
/// encoded frames into via [`LocalTrack::write_sample`].
#[derive(Debug, Clone, Default)]
pub struct SampleDevices {
    config: MediaConfig,
}

impl SampleDevices {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    fn check(access: DeviceAccess, device: &'static str) -> Result<(), MediaError> {
        match access {
            DeviceAccess::Granted => Ok(()),
            DeviceAccess::Denied => Err(MediaError::PermissionDenied(device)),
            DeviceAccess::Missing => Err(MediaError::DeviceNotFound(device)),
        }
    }

    fn codec(mime_type: &str) -> RTCRtpCodecCapability {
        RTCRtpCodecCapability {
            mime_type: mime_type.to_owned(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl MediaDevices for SampleDevices {
    async fn open_user_media(&self) -> Result<UserMedia, MediaError> {
        Self::check(self.config.microphone, "microphone")?;
        Self::check(self.config.camera, "camera")?;

        let stream_id = format!("meshcall-{}", uuid::Uuid::new_v4());
        let audio = LocalTrack::new(
            TrackSource::Microphone,
            Self::codec(&self.config.audio_mime_type),
            &stream_id,
        );
        let camera = LocalTrack::new(
            TrackSource::Camera,
            Self::codec(&self.config.video_mime_type),
            &stream_id,
        );
        debug!("Opened user media {} / {}", audio.id(), camera.id());

        Ok(UserMedia { audio, camera })
    }

    async fn open_display_media(&self) -> Result<LocalTrack, MediaError> {
        match self.config.screen {
            DeviceAccess::Granted => {}
            DeviceAccess::Denied => {
                warn!("Screen capture picker dismissed");
                return Err(MediaError::ScreenCaptureCancelled);
            }
            DeviceAccess::Missing => return Err(MediaError::DeviceNotFound("screen")),
        }

        let stream_id = format!("meshcall-screen-{}", uuid::Uuid::new_v4());
        Ok(LocalTrack::new(
            TrackSource::Screen,
            Self::codec(&self.config.video_mime_type),
            &stream_id,
        ))
    }
}
