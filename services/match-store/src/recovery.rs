//! Startup recovery: rebuild the store by replaying its journal
//!
//! Replay re-checks every invariant the live store enforces. A journal that
//! would produce an over-capacity match or a duplicate seat is rejected
//! outright instead of being loaded.

use crate::events::StoreEvent;
use crate::log::JournalLog;
use crate::store::{lock, MatchCell, MatchStore};
use dashmap::mapref::entry::Entry;
use persistence::{CorruptionRecord, JournalConfig, JournalError, JournalReader, JournalWriter, ReaderError};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("Reader error: {0}")]
    Reader(#[from] ReaderError),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Undecodable {kind} event at sequence {sequence}: {reason}")]
    Decode {
        sequence: u64,
        kind: String,
        reason: String,
    },

    #[error("Inconsistent journal at sequence {sequence}: {reason}")]
    Inconsistent { sequence: u64, reason: String },
}

/// Summary of a completed recovery
#[derive(Debug)]
pub struct RecoveryReport {
    pub replayed: usize,
    pub matches: usize,
    pub users: usize,
    pub next_sequence: u64,
    pub corruption: Vec<CorruptionRecord>,
    pub elapsed_ms: u64,
}

impl MatchStore {
    /// Open a journal-backed store, replaying everything already committed.
    pub fn open(config: JournalConfig) -> Result<(Self, RecoveryReport), RecoveryError> {
        let started = Instant::now();
        let outcome = JournalReader::open(&config.dir)?.read_all()?;
        let next_sequence = outcome.last_sequence().map_or(1, |s| s + 1);

        let writer = JournalWriter::open(config, next_sequence)?;
        let store = MatchStore::new(Arc::new(JournalLog::new(writer)));

        for entry in &outcome.entries {
            let event = StoreEvent::decode(&entry.payload).map_err(|e| RecoveryError::Decode {
                sequence: entry.sequence,
                kind: entry.kind.clone(),
                reason: e.to_string(),
            })?;
            if event.kind() != entry.kind {
                return Err(RecoveryError::Inconsistent {
                    sequence: entry.sequence,
                    reason: format!("entry tagged {} holds {}", entry.kind, event.kind()),
                });
            }
            store
                .replay(event)
                .map_err(|reason| RecoveryError::Inconsistent {
                    sequence: entry.sequence,
                    reason,
                })?;
        }

        let report = RecoveryReport {
            replayed: outcome.entries.len(),
            matches: store.match_count(),
            users: store.user_count(),
            next_sequence,
            corruption: outcome.corruption,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        if report.corruption.is_empty() {
            tracing::info!(
                replayed = report.replayed,
                matches = report.matches,
                users = report.users,
                elapsed_ms = report.elapsed_ms,
                "match store recovered"
            );
        } else {
            tracing::warn!(
                replayed = report.replayed,
                damaged_segments = report.corruption.len(),
                "match store recovered with damaged journal tail"
            );
        }
        Ok((store, report))
    }

    /// Apply one journaled event without logging it again.
    fn replay(&self, event: StoreEvent) -> Result<(), String> {
        match event {
            StoreEvent::MatchCreated { record, order } => {
                if !record.check_invariant() || record.current_players != 1 {
                    return Err(format!(
                        "match {} created with {} players",
                        record.match_id, record.current_players
                    ));
                }
                let match_id = record.match_id;
                match self.matches.entry(match_id) {
                    Entry::Occupied(_) => return Err(format!("match {} created twice", match_id)),
                    Entry::Vacant(slot) => {
                        slot.insert(Arc::new(Mutex::new(MatchCell::open(record, order))));
                    }
                }
                self.next_order.fetch_max(order + 1, Ordering::SeqCst);
            }
            StoreEvent::PlayerJoined { participant } => {
                let cell = self
                    .cell(participant.match_id)
                    .map_err(|_| format!("join for unknown match {}", participant.match_id))?;
                let mut cell = lock(&cell);
                if cell.is_seated(&participant.wallet_address) {
                    return Err(format!(
                        "{} seated twice in match {}",
                        participant.wallet_address, participant.match_id
                    ));
                }
                if cell.record.is_full() {
                    return Err(format!("join beyond capacity in match {}", participant.match_id));
                }
                if participant.seat != cell.next_seat() {
                    return Err(format!(
                        "seat {} out of order in match {}, expected {}",
                        participant.seat,
                        participant.match_id,
                        cell.next_seat()
                    ));
                }
                cell.seat(participant);
            }
            StoreEvent::UserUpserted { user } => {
                let wallet = user.wallet_address.clone();
                let previous = self.users.insert(wallet.clone(), user.clone());

                let stale = previous
                    .and_then(|p| p.telegram_id)
                    .filter(|old| Some(*old) != user.telegram_id);
                if let Some(old) = stale {
                    self.telegram_index.remove_if(&old, |_, owner| *owner == wallet);
                }
                if let Some(telegram_id) = user.telegram_id {
                    if let Some(owner) = self.telegram_index.insert(telegram_id, wallet.clone()) {
                        if owner != wallet {
                            return Err(format!(
                                "telegram {} linked to both {} and {}",
                                telegram_id, owner, wallet
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
