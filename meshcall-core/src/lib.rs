pub mod model;

pub use model::{
    IceCandidate, IceServerConfig, NegotiationPayload, Participant, PeerId, RoomId,
    SignalMessage,
};
