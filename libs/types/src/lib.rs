//! Types library for the pickup match reservation service
//!
//! This library provides the core type definitions shared by the match
//! store, the reservation service and the HTTP gateway.
//!
//! # Modules
//! - `ids`: Identifiers (MatchId, WalletAddress, TelegramId)
//! - `matches`: Match, participant and slot-count types
//! - `user`: User identity and profile types
//! - `errors`: Error taxonomy

pub mod ids;
pub mod matches;
pub mod user;
pub mod errors;

/// Current wall-clock time as unix nanoseconds
pub fn now_nanos() -> i64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or(i64::MAX)
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::matches::*;
    pub use crate::user::*;
    pub use crate::errors::*;
}
