//! Match Store
//!
//! Sole owner of match, participant and user state. Enforces, under any
//! amount of concurrent access:
//! - `0 < current_players <= slots_needed` for every match
//! - at most one participant record per (match, user)
//!
//! Joins against one match are serialized by a per-match lock held across
//! the whole check-and-increment; joins against different matches never
//! share a lock. Every mutation is appended to an [`EventLog`] before it
//! becomes visible, so a failed append leaves state untouched.

pub mod events;
pub mod log;
pub mod recovery;
pub mod store;
mod users;

pub use events::StoreEvent;
pub use log::{EventLog, JournalLog, MemoryLog};
pub use recovery::{RecoveryError, RecoveryReport};
pub use store::MatchStore;
