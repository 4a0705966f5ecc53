use thiserror::Error;
use types::errors::{ReservationError, ValidationError};

/// Errors surfaced by the reservation service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error(transparent)]
    Reservation(#[from] ReservationError),

    #[error("Wallet signature rejected for {0}")]
    InvalidSignature(String),

    /// The blocking task running a store call panicked or was cancelled
    #[error("Store worker failed: {0}")]
    Worker(String),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Reservation(err.into())
    }
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Reservation(e) => e.code(),
            ServiceError::InvalidSignature(_) => "UNAUTHORIZED",
            ServiceError::Worker(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Reservation(e) if e.is_retryable())
    }
}
