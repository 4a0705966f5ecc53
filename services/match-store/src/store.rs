//! Match store core
//!
//! Each match lives in its own `Mutex`-guarded cell. The map hands out an
//! `Arc` to the cell and releases its shard lock before the cell is locked,
//! so the only thing two joins ever contend on is the cell of the match
//! they both target.

use crate::events::StoreEvent;
use crate::log::{EventLog, MemoryLog};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use types::errors::ReservationError;
use types::ids::{MatchId, TelegramId, WalletAddress};
use types::matches::{Match, MatchParticipant, NewMatch};
use types::user::User;

/// Per-match state. Only this module mutates `record.current_players`.
#[derive(Debug)]
pub(crate) struct MatchCell {
    pub(crate) record: Match,
    /// Creation order, used for stable listing
    pub(crate) order: u64,
    /// Seat order; `participants[i].seat == i + 1`
    pub(crate) participants: Vec<MatchParticipant>,
}

impl MatchCell {
    pub(crate) fn open(record: Match, order: u64) -> Self {
        let organizer = MatchParticipant {
            match_id: record.match_id,
            wallet_address: record.organizer.clone(),
            seat: 1,
            joined_at: record.created_at,
        };
        Self {
            record,
            order,
            participants: vec![organizer],
        }
    }

    pub(crate) fn is_seated(&self, wallet: &WalletAddress) -> bool {
        self.participants.iter().any(|p| &p.wallet_address == wallet)
    }

    pub(crate) fn next_seat(&self) -> u32 {
        self.record.current_players + 1
    }

    /// Take the next seat. Callers have already checked capacity and
    /// uniqueness while holding the cell lock.
    pub(crate) fn seat(&mut self, participant: MatchParticipant) {
        debug_assert_eq!(participant.seat, self.next_seat());
        self.record.current_players += 1;
        self.participants.push(participant);
        debug_assert!(self.record.check_invariant());
    }
}

/// Lock a cell.
///
/// Cells are only mutated after the last fallible step of an operation, so
/// a cell whose lock was poisoned by a panicking holder is still consistent.
pub(crate) fn lock(cell: &Mutex<MatchCell>) -> MutexGuard<'_, MatchCell> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Storage for matches, participants and users
pub struct MatchStore {
    pub(crate) matches: DashMap<MatchId, Arc<Mutex<MatchCell>>>,
    pub(crate) users: DashMap<WalletAddress, User>,
    pub(crate) telegram_index: DashMap<TelegramId, WalletAddress>,
    pub(crate) next_order: AtomicU64,
    pub(crate) log: Arc<dyn EventLog>,
}

impl MatchStore {
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self {
            matches: DashMap::new(),
            users: DashMap::new(),
            telegram_index: DashMap::new(),
            next_order: AtomicU64::new(0),
            log,
        }
    }

    /// A store with no durability
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryLog::default()))
    }

    /// Create a match, seating the organizer.
    pub fn create_match(&self, new: NewMatch) -> Result<Match, ReservationError> {
        new.validate()?;

        let record = Match::open(new, types::now_nanos());
        let order = self.next_order.fetch_add(1, Ordering::SeqCst);

        self.log.append(&StoreEvent::MatchCreated {
            record: record.clone(),
            order,
        })?;
        self.matches.insert(
            record.match_id,
            Arc::new(Mutex::new(MatchCell::open(record.clone(), order))),
        );

        tracing::info!(
            match_id = %record.match_id,
            organizer = %record.organizer,
            slots = record.slots_needed.get(),
            "match created"
        );
        Ok(record)
    }

    pub fn get_match(&self, match_id: MatchId) -> Result<Match, ReservationError> {
        let cell = self.cell(match_id)?;
        let record = lock(&cell).record.clone();
        Ok(record)
    }

    /// All matches, oldest first
    pub fn list_matches(&self) -> Vec<Match> {
        let cells: Vec<Arc<Mutex<MatchCell>>> =
            self.matches.iter().map(|e| Arc::clone(e.value())).collect();

        let mut rows: Vec<(u64, Match)> = cells
            .iter()
            .map(|cell| {
                let cell = lock(cell);
                (cell.order, cell.record.clone())
            })
            .collect();
        rows.sort_by_key(|(order, _)| *order);
        rows.into_iter().map(|(_, record)| record).collect()
    }

    /// Participants of a match in seat order
    pub fn participants(&self, match_id: MatchId) -> Result<Vec<MatchParticipant>, ReservationError> {
        let cell = self.cell(match_id)?;
        let participants = lock(&cell).participants.clone();
        Ok(participants)
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Seat `wallet` in the match.
    ///
    /// The whole check-and-increment runs under the match's cell lock, so
    /// joins on one match are applied one at a time: with one seat left and
    /// any number of concurrent callers, exactly one wins.
    pub fn join_match(
        &self,
        match_id: MatchId,
        wallet: &WalletAddress,
    ) -> Result<Match, ReservationError> {
        let cell = self.cell(match_id)?;
        let mut cell = lock(&cell);

        if cell.is_seated(wallet) {
            tracing::debug!(%match_id, %wallet, "join rejected: already seated");
            return Err(ReservationError::AlreadyJoined {
                match_id: match_id.to_string(),
                wallet: wallet.to_string(),
            });
        }
        if cell.record.is_full() {
            tracing::debug!(%match_id, %wallet, "join rejected: match full");
            return Err(ReservationError::MatchFull {
                match_id: match_id.to_string(),
                slots_needed: cell.record.slots_needed.get(),
            });
        }

        let participant = MatchParticipant {
            match_id,
            wallet_address: wallet.clone(),
            seat: cell.next_seat(),
            joined_at: types::now_nanos(),
        };
        self.log.append(&StoreEvent::PlayerJoined {
            participant: participant.clone(),
        })?;
        cell.seat(participant);

        tracing::info!(
            %match_id,
            %wallet,
            current_players = cell.record.current_players,
            slots = cell.record.slots_needed.get(),
            "player joined"
        );
        Ok(cell.record.clone())
    }

    /// Shared handle to a match cell; the map's shard lock is released on return.
    pub(crate) fn cell(&self, match_id: MatchId) -> Result<Arc<Mutex<MatchCell>>, ReservationError> {
        self.matches
            .get(&match_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ReservationError::match_not_found(match_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::errors::ValidationError;
    use types::matches::{MatchStatus, SlotCount};

    fn wallet(name: &str) -> WalletAddress {
        WalletAddress::parse(name).unwrap()
    }

    fn new_match(slots: SlotCount) -> NewMatch {
        NewMatch::new(wallet("EQorganizer"), "Hala OSiR Mokotów", 1500, slots, None).unwrap()
    }

    #[test]
    fn test_create_then_get_round_trip() {
        let store = MatchStore::in_memory();
        let created = store.create_match(new_match(SlotCount::Eight)).unwrap();

        let fetched = store.get_match(created.match_id).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.current_players, 1);
        assert_eq!(fetched.slots_available(), 7);

        let listed = store.list_matches();
        assert_eq!(listed, vec![created.clone()]);

        let seats = store.participants(created.match_id).unwrap();
        assert_eq!(seats.len(), 1);
        assert_eq!(seats[0].wallet_address, wallet("EQorganizer"));
        assert_eq!(seats[0].seat, 1);
    }

    #[test]
    fn test_fill_eight_slot_match() {
        let store = MatchStore::in_memory();
        let m = store.create_match(new_match(SlotCount::Eight)).unwrap();

        for i in 0..6 {
            store.join_match(m.match_id, &wallet(&format!("EQp{}", i))).unwrap();
        }
        let m7 = store.get_match(m.match_id).unwrap();
        assert_eq!(m7.current_players, 7);
        assert_eq!(m7.slots_available(), 1);

        let m8 = store.join_match(m.match_id, &wallet("EQp6")).unwrap();
        assert_eq!(m8.current_players, 8);
        assert_eq!(m8.slots_available(), 0);
        assert_eq!(m8.status(), MatchStatus::Full);

        let err = store.join_match(m.match_id, &wallet("EQp7")).unwrap_err();
        assert!(matches!(err, ReservationError::MatchFull { slots_needed: 8, .. }));
        assert_eq!(store.get_match(m.match_id).unwrap(), m8);
        assert_eq!(store.participants(m.match_id).unwrap().len(), 8);
    }

    #[test]
    fn test_organizer_cannot_join_own_match() {
        let store = MatchStore::in_memory();
        let m = store.create_match(new_match(SlotCount::Ten)).unwrap();

        let err = store.join_match(m.match_id, &wallet("EQorganizer")).unwrap_err();
        assert!(matches!(err, ReservationError::AlreadyJoined { .. }));
        assert_eq!(store.get_match(m.match_id).unwrap().current_players, 1);
    }

    #[test]
    fn test_repeat_join_is_rejected_without_change() {
        let store = MatchStore::in_memory();
        let m = store.create_match(new_match(SlotCount::Ten)).unwrap();
        store.join_match(m.match_id, &wallet("EQp1")).unwrap();

        for _ in 0..3 {
            let err = store.join_match(m.match_id, &wallet("EQp1")).unwrap_err();
            assert_eq!(err.code(), "ALREADY_JOINED");
        }
        assert_eq!(store.get_match(m.match_id).unwrap().current_players, 2);
    }

    #[test]
    fn test_invalid_new_match_persists_nothing() {
        let store = MatchStore::in_memory();
        let mut bad = new_match(SlotCount::Eight);
        bad.venue = "  ".into();

        let err = store.create_match(bad).unwrap_err();
        assert_eq!(err, ReservationError::Validation(ValidationError::EmptyVenue));
        assert_eq!(store.match_count(), 0);
    }

    #[test]
    fn test_unknown_match_is_not_found() {
        let store = MatchStore::in_memory();
        let missing = MatchId::new();
        assert_eq!(store.get_match(missing).unwrap_err().code(), "NOT_FOUND");
        assert_eq!(
            store.join_match(missing, &wallet("EQp1")).unwrap_err().code(),
            "NOT_FOUND"
        );
        assert_eq!(store.participants(missing).unwrap_err().code(), "NOT_FOUND");
    }

    #[test]
    fn test_list_is_in_creation_order() {
        let store = MatchStore::in_memory();
        let ids: Vec<MatchId> = (0..5)
            .map(|_| store.create_match(new_match(SlotCount::Ten)).unwrap().match_id)
            .collect();
        let listed: Vec<MatchId> = store.list_matches().iter().map(|m| m.match_id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn test_every_mutation_is_logged() {
        let log = Arc::new(MemoryLog::default());
        let store = MatchStore::new(log.clone());
        let m = store.create_match(new_match(SlotCount::Eight)).unwrap();
        store.join_match(m.match_id, &wallet("EQp1")).unwrap();
        let _ = store.join_match(m.match_id, &wallet("EQp1"));
        assert_eq!(log.appended(), 2);
    }
}
