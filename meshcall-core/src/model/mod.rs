mod participant;
mod peer;
mod room;
mod signaling;

pub use participant::Participant;
pub use peer::PeerId;
pub use room::RoomId;
pub use signaling::{IceCandidate, IceServerConfig, NegotiationPayload, SignalMessage};
