//! User identity and profile types

use crate::ids::{TelegramId, WalletAddress};
use serde::{Deserialize, Serialize};

/// Free-form player profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub nickname: Option<String>,
    pub age: Option<u16>,
    pub city: Option<String>,
    pub skill_level: Option<String>,
    pub position: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub height_cm: Option<u16>,
    pub jersey_number: Option<u16>,
}

/// Partial profile write; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub nickname: Option<String>,
    pub age: Option<u16>,
    pub city: Option<String>,
    pub skill_level: Option<String>,
    pub position: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub height_cm: Option<u16>,
    pub jersey_number: Option<u16>,
}

impl Profile {
    pub fn apply(&mut self, update: ProfileUpdate) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut self.nickname, update.nickname);
        set(&mut self.age, update.age);
        set(&mut self.city, update.city);
        set(&mut self.skill_level, update.skill_level);
        set(&mut self.position, update.position);
        set(&mut self.bio, update.bio);
        set(&mut self.phone, update.phone);
        set(&mut self.height_cm, update.height_cm);
        set(&mut self.jersey_number, update.jersey_number);
    }
}

/// A user, keyed by wallet address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub wallet_address: WalletAddress,
    pub telegram_id: Option<TelegramId>,
    pub telegram_username: Option<String>,
    pub profile: Profile,
    /// Unix nanoseconds
    pub created_at: i64,
}

impl User {
    pub fn new(wallet_address: WalletAddress, created_at: i64) -> Self {
        Self {
            wallet_address,
            telegram_id: None,
            telegram_username: None,
            profile: Profile::default(),
            created_at,
        }
    }
}
