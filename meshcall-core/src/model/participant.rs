use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

/// A member of a room as reported by the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub peer_id: PeerId,
    pub user_id: String,
    pub display_name: String,
}

impl Participant {
    pub fn new(peer_id: PeerId, user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            peer_id,
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}
