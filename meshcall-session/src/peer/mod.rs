mod candidate_queue;
mod link_driver;
mod peer_link;

pub use peer_link::*;

pub(crate) use link_driver::LinkTracks;
