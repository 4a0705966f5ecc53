//! Error types for the reservation core
//!
//! Every failure carries a stable machine-checkable code alongside its
//! human-readable message. Only `StorageUnavailable` is transient.

use thiserror::Error;

/// Top-level reservation error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReservationError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Match {match_id} is full ({slots_needed} of {slots_needed} slots taken)")]
    MatchFull { match_id: String, slots_needed: u32 },

    #[error("User {wallet} already joined match {match_id}")]
    AlreadyJoined { match_id: String, wallet: String },

    #[error("Telegram account {telegram_id} is linked to another wallet")]
    IdentityConflict { telegram_id: i64 },

    #[error("Storage unavailable: {reason}")]
    StorageUnavailable { reason: String },
}

impl ReservationError {
    pub fn match_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "Match",
            id: id.to_string(),
        }
    }

    pub fn user_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "User",
            id: id.to_string(),
        }
    }

    pub fn storage(reason: impl ToString) -> Self {
        Self::StorageUnavailable {
            reason: reason.to_string(),
        }
    }

    /// Stable code surfaced to callers
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::MatchFull { .. } => "MATCH_FULL",
            Self::AlreadyJoined { .. } => "ALREADY_JOINED",
            Self::IdentityConflict { .. } => "IDENTITY_CONFLICT",
            Self::StorageUnavailable { .. } => "STORAGE_UNAVAILABLE",
        }
    }

    /// Business outcomes are final; only storage outages may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }
}

/// Malformed input rejected before any state is touched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("venue must not be empty")]
    EmptyVenue,

    #[error("venue is too long: {0} characters")]
    VenueTooLong(usize),

    #[error("slots needed must be one of 8 or 10, got {0}")]
    InvalidSlotCount(i64),

    #[error("crowdfund amount must be non-negative, got {0}")]
    NegativeCrowdfund(i64),

    #[error("wallet address must not be empty")]
    EmptyWalletAddress,

    #[error("invalid wallet address: {0:?}")]
    InvalidWalletAddress(String),

    #[error("invalid match id: {0:?}")]
    InvalidMatchId(String),

    #[error("invalid telegram id: {0}")]
    InvalidTelegramId(i64),

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::InvalidSlotCount(7);
        assert_eq!(err.to_string(), "slots needed must be one of 8 or 10, got 7");
    }

    #[test]
    fn test_reservation_error_from_validation() {
        let err: ReservationError = ValidationError::EmptyVenue.into();
        assert!(matches!(err, ReservationError::Validation(_)));
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_only_storage_errors_are_retryable() {
        assert!(ReservationError::storage("disk gone").is_retryable());
        assert!(!ReservationError::MatchFull {
            match_id: "m".into(),
            slots_needed: 8
        }
        .is_retryable());
        assert!(!ReservationError::AlreadyJoined {
            match_id: "m".into(),
            wallet: "w".into()
        }
        .is_retryable());
        assert!(!ReservationError::match_not_found("m").is_retryable());
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            ReservationError::from(ValidationError::EmptyVenue),
            ReservationError::match_not_found("m"),
            ReservationError::MatchFull {
                match_id: "m".into(),
                slots_needed: 8,
            },
            ReservationError::AlreadyJoined {
                match_id: "m".into(),
                wallet: "w".into(),
            },
            ReservationError::IdentityConflict { telegram_id: 1 },
            ReservationError::storage("x"),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
