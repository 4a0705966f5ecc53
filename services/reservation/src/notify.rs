//! Outbound notifications after successful reservations
//!
//! Sinks are fire-and-forget: they run after the store has committed and
//! have no way to fail the operation that triggered them.

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use types::ids::{MatchId, WalletAddress};

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    MatchCreated {
        match_id: MatchId,
        venue: String,
        organizer: WalletAddress,
        slots_needed: u32,
    },
    PlayerJoined {
        match_id: MatchId,
        wallet: WalletAddress,
        current_players: u32,
        slots_needed: u32,
    },
}

impl Notification {
    /// True when this notification marks the last free slot being taken
    pub fn fills_match(&self) -> bool {
        matches!(
            self,
            Notification::PlayerJoined { current_players, slots_needed, .. }
                if current_players == slots_needed
        )
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Default sink: writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, notification: Notification) {
        let full = notification.fills_match();
        match notification {
            Notification::MatchCreated {
                match_id,
                venue,
                organizer,
                slots_needed,
            } => {
                tracing::info!(%match_id, %venue, %organizer, slots_needed, "notify: match created");
            }
            Notification::PlayerJoined {
                match_id,
                wallet,
                current_players,
                slots_needed,
            } => {
                tracing::info!(
                    %match_id,
                    %wallet,
                    current_players,
                    slots_needed,
                    full,
                    "notify: player joined"
                );
            }
        }
    }
}

/// Forwards notifications to a bounded channel, e.g. a chat bot worker.
///
/// A full queue drops the notification instead of stalling the request
/// that produced it.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationSink for ChannelNotifier {
    async fn notify(&self, notification: Notification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(?dropped, "notification queue full; dropping notification");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("notification receiver dropped");
            }
        }
    }
}
