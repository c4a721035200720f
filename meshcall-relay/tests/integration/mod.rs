
use meshcall_core::{RoomId, SignalMessage};
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn join(room: &str, name: &str) -> SignalMessage {
    SignalMessage::Join {
        room_id: RoomId::from(room),
        user_id: format!("user-{name}"),
        display_name: name.to_owned(),
    }
}
