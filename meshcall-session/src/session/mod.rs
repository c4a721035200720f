mod session;
mod session_builder;
mod session_command;
mod session_event;
mod session_handle;
mod snapshot;

pub use session::Session;
pub use session_builder::SessionBuilder;
pub use session_event::SessionEvent;
pub use session_handle::{SessionEvents, SessionHandle};
pub use snapshot::{PeerLinkSnapshot, SessionSnapshot};
