//! Reservation Service
//!
//! The async face of the Match Store. Callers hand in raw identifiers and
//! request bodies; the service validates them, runs the store operation off
//! the async runtime, retries storage outages, and reports committed
//! reservations to a [`NotificationSink`].

pub mod error;
pub mod identity;
pub mod notify;
pub mod retry;
pub mod service;
pub mod views;

pub use error::ServiceError;
pub use identity::{AcceptAllVerifier, SignatureVerifier};
pub use notify::{ChannelNotifier, LogNotifier, Notification, NotificationSink};
pub use retry::RetryPolicy;
pub use service::ReservationService;
pub use views::{CreateMatchRequest, JoinOutcome, MatchView, ParticipantView};
