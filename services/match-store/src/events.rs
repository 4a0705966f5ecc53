//! Events appended to the store's log, one per mutation

use serde::{Deserialize, Serialize};
use types::matches::{Match, MatchParticipant};
use types::user::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreEvent {
    /// A match was opened with its organizer in seat 1
    MatchCreated { record: Match, order: u64 },
    /// A player took the next free seat
    PlayerJoined { participant: MatchParticipant },
    /// Full user record after a create, profile write or identity link
    UserUpserted { user: User },
}

impl StoreEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::MatchCreated { .. } => "MatchCreated",
            StoreEvent::PlayerJoined { .. } => "PlayerJoined",
            StoreEvent::UserUpserted { .. } => "UserUpserted",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
