use meshcall_core::IceServerConfig;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

/// Settings for one call session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// STUN/TURN servers for every PeerLink. Replaced by the relay's `ice-config` if it sends one.
    pub ice_servers: Vec<IceServerConfig>,
    /// How long to wait for the relay's `welcome` after the channel opens.
    #[serde(with = "millis")]
    pub handshake_timeout: Duration,
    /// Capacity of the channel transports report into.
    pub transport_event_buffer: usize,
}

impl SessionConfig {
    /// `transport_event_buffer`, raised to the smallest usable channel size.
    pub fn transport_event_capacity(&self) -> usize {
        self.transport_event_buffer.max(1)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_ADDR)],
            handshake_timeout: Duration::from_secs(5),
            transport_event_buffer: 256,
        }
    }
}

/// Settings for [`crate::media::SampleDevices`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub audio_mime_type: String,
    pub video_mime_type: String,
    pub microphone: DeviceAccess,
    pub camera: DeviceAccess,
    pub screen: DeviceAccess,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            audio_mime_type: "audio/opus".to_owned(),
            video_mime_type: "video/VP8".to_owned(),
            microphone: DeviceAccess::Granted,
            camera: DeviceAccess::Granted,
            screen: DeviceAccess::Granted,
        }
    }
}

/// What happens when a device is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceAccess {
    Granted,
    Denied,
    Missing,
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
