pub mod config;
pub mod hub;
pub mod server;
pub mod signaling;

pub use config::*;
pub use hub::*;
pub use server::*;
pub use signaling::*;
