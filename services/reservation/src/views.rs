//! Request and response shapes at the service boundary

use serde::{Deserialize, Serialize};
use types::errors::ValidationError;
use types::ids::{MatchId, WalletAddress};
use types::matches::{Match, MatchParticipant, MatchStatus, NewMatch, SlotCount};

/// Raw create request, before coercion into domain types
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub organizer: String,
    pub venue: String,
    #[serde(default)]
    pub crowdfund_amount: i64,
    pub slots_needed: i64,
    #[serde(default)]
    pub scheduled_for: Option<String>,
}

impl CreateMatchRequest {
    pub fn validate(self) -> Result<NewMatch, ValidationError> {
        let organizer = WalletAddress::parse(&self.organizer)?;
        let crowdfund_amount = u64::try_from(self.crowdfund_amount)
            .map_err(|_| ValidationError::NegativeCrowdfund(self.crowdfund_amount))?;
        let slots_needed = SlotCount::try_from(self.slots_needed)?;
        NewMatch::new(
            organizer,
            &self.venue,
            crowdfund_amount,
            slots_needed,
            self.scheduled_for,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub match_id: MatchId,
    pub venue: String,
    pub crowdfund_amount: u64,
    pub slots_needed: u32,
    pub current_players: u32,
    pub slots_available: u32,
    pub organizer: WalletAddress,
    pub status: MatchStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scheduled_for: Option<String>,
    pub created_at: i64,
}

impl From<&Match> for MatchView {
    fn from(m: &Match) -> Self {
        Self {
            match_id: m.match_id,
            venue: m.venue.clone(),
            crowdfund_amount: m.crowdfund_amount,
            slots_needed: m.slots_needed.get(),
            current_players: m.current_players,
            slots_available: m.slots_available(),
            organizer: m.organizer.clone(),
            status: m.status(),
            scheduled_for: m.scheduled_for.clone(),
            created_at: m.created_at,
        }
    }
}

/// Result of a successful join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinOutcome {
    pub match_id: MatchId,
    pub current_players: u32,
    pub slots_available: u32,
}

impl From<&Match> for JoinOutcome {
    fn from(m: &Match) -> Self {
        Self {
            match_id: m.match_id,
            current_players: m.current_players,
            slots_available: m.slots_available(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub wallet_address: WalletAddress,
    pub seat: u32,
    pub joined_at: i64,
}

impl From<MatchParticipant> for ParticipantView {
    fn from(p: MatchParticipant) -> Self {
        Self {
            wallet_address: p.wallet_address,
            seat: p.seat,
            joined_at: p.joined_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(slots: i64, crowdfund: i64) -> CreateMatchRequest {
        CreateMatchRequest {
            organizer: "EQorganizer".into(),
            venue: "Hala OSiR Mokotów".into(),
            crowdfund_amount: crowdfund,
            slots_needed: slots,
            scheduled_for: Some("Today, 18:00".into()),
        }
    }

    #[test]
    fn test_request_coercion() {
        let new = request(10, 1500).validate().unwrap();
        assert_eq!(new.slots_needed, SlotCount::Ten);
        assert_eq!(new.crowdfund_amount, 1500);
        assert_eq!(new.organizer.as_str(), "EQorganizer");
    }

    #[test]
    fn test_request_rejects_bad_values() {
        assert_eq!(
            request(7, 0).validate().unwrap_err(),
            ValidationError::InvalidSlotCount(7)
        );
        assert_eq!(
            request(8, -1).validate().unwrap_err(),
            ValidationError::NegativeCrowdfund(-1)
        );
        let mut no_organizer = request(8, 0);
        no_organizer.organizer = " ".into();
        assert_eq!(
            no_organizer.validate().unwrap_err(),
            ValidationError::EmptyWalletAddress
        );
    }

    #[test]
    fn test_match_view_json_shape() {
        let new = request(8, 1500).validate().unwrap();
        let m = Match::open(new, 42);
        let json = serde_json::to_value(MatchView::from(&m)).unwrap();

        assert_eq!(json["slotsNeeded"], 8);
        assert_eq!(json["currentPlayers"], 1);
        assert_eq!(json["slotsAvailable"], 7);
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["scheduledFor"], "Today, 18:00");
        assert_eq!(json["matchId"], m.match_id.to_string());
    }
}
