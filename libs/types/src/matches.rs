//! Match and participant types
//!
//! A match is a reservation unit with a fixed number of slots. The organizer
//! always holds seat 1, so a freshly created match has one player.

use crate::errors::ValidationError;
use crate::ids::{MatchId, WalletAddress};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest venue name accepted, in characters
pub const MAX_VENUE_LEN: usize = 200;

/// Allowed party sizes
///
/// Serialized as the plain number of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SlotCount {
    Eight,
    Ten,
}

impl SlotCount {
    pub fn get(self) -> u32 {
        match self {
            SlotCount::Eight => 8,
            SlotCount::Ten => 10,
        }
    }
}

impl TryFrom<i64> for SlotCount {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            8 => Ok(SlotCount::Eight),
            10 => Ok(SlotCount::Ten),
            other => Err(ValidationError::InvalidSlotCount(other)),
        }
    }
}

impl TryFrom<u32> for SlotCount {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        SlotCount::try_from(i64::from(value))
    }
}

impl From<SlotCount> for u32 {
    fn from(slots: SlotCount) -> Self {
        slots.get()
    }
}

impl fmt::Display for SlotCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Derived occupancy status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchStatus {
    Open,
    Full,
}

/// A pickup match
///
/// Invariant: 0 < current_players <= slots_needed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub match_id: MatchId,
    pub venue: String,
    /// Minor currency units
    pub crowdfund_amount: u64,
    pub slots_needed: SlotCount,
    pub current_players: u32,
    pub organizer: WalletAddress,
    /// Free-form kickoff label, e.g. "Today, 18:00"
    pub scheduled_for: Option<String>,
    /// Unix nanoseconds
    pub created_at: i64,
}

impl Match {
    /// Build a new match from validated input, seating the organizer
    pub fn open(new: NewMatch, created_at: i64) -> Self {
        Self {
            match_id: MatchId::new(),
            venue: new.venue,
            crowdfund_amount: new.crowdfund_amount,
            slots_needed: new.slots_needed,
            current_players: 1,
            organizer: new.organizer,
            scheduled_for: new.scheduled_for,
            created_at,
        }
    }

    pub fn slots_available(&self) -> u32 {
        self.slots_needed.get().saturating_sub(self.current_players)
    }

    pub fn is_full(&self) -> bool {
        self.current_players >= self.slots_needed.get()
    }

    pub fn status(&self) -> MatchStatus {
        if self.is_full() {
            MatchStatus::Full
        } else {
            MatchStatus::Open
        }
    }

    /// Check capacity invariant: 0 < current_players <= slots_needed
    pub fn check_invariant(&self) -> bool {
        self.current_players > 0 && self.current_players <= self.slots_needed.get()
    }
}

/// One occupied slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchParticipant {
    pub match_id: MatchId,
    pub wallet_address: WalletAddress,
    /// 1-based; the organizer is seat 1
    pub seat: u32,
    /// Unix nanoseconds
    pub joined_at: i64,
}

/// Validated input for creating a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub organizer: WalletAddress,
    pub venue: String,
    pub crowdfund_amount: u64,
    pub slots_needed: SlotCount,
    pub scheduled_for: Option<String>,
}

impl NewMatch {
    pub fn new(
        organizer: WalletAddress,
        venue: &str,
        crowdfund_amount: u64,
        slots_needed: SlotCount,
        scheduled_for: Option<String>,
    ) -> Result<Self, ValidationError> {
        let scheduled_for = scheduled_for
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let new = Self {
            organizer,
            venue: venue.trim().to_string(),
            crowdfund_amount,
            slots_needed,
            scheduled_for,
        };
        new.validate()?;
        Ok(new)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.venue.trim().is_empty() {
            return Err(ValidationError::EmptyVenue);
        }
        let len = self.venue.chars().count();
        if len > MAX_VENUE_LEN {
            return Err(ValidationError::VenueTooLong(len));
        }
        Ok(())
    }
}
