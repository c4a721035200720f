mod connector;
mod signaling_client;
mod signaling_event;
mod ws_connector;

pub use connector::*;
pub use signaling_client::*;
pub use signaling_event::*;
pub use ws_connector::*;
