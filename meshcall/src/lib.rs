pub use meshcall_core::{Participant, PeerId, RoomId};

pub mod model {
    pub use meshcall_core::model::*;
}

#[cfg(feature = "session")]
pub mod session {
    pub use meshcall_session::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use meshcall_relay::*;
}
