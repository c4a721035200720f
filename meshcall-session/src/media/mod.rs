mod local_media;
mod local_track;
mod media_devices;
mod sample_devices;

pub use local_media::*;
pub use local_track::*;
pub use media_devices::*;
pub use sample_devices::*;
