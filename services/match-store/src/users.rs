//! User records and identity links
//!
//! Lock order: Telegram index entry, then user entry, then the event log.

use crate::events::StoreEvent;
use crate::store::MatchStore;
use dashmap::mapref::entry::Entry;
use types::errors::ReservationError;
use types::ids::{TelegramId, WalletAddress};
use types::user::{ProfileUpdate, User};

impl MatchStore {
    /// Return the user, creating an empty record on first sight.
    pub fn upsert_user(&self, wallet: &WalletAddress) -> Result<User, ReservationError> {
        if let Some(user) = self.users.get(wallet) {
            return Ok(user.clone());
        }

        match self.users.entry(wallet.clone()) {
            Entry::Occupied(existing) => Ok(existing.get().clone()),
            Entry::Vacant(slot) => {
                let user = User::new(wallet.clone(), types::now_nanos());
                self.log.append(&StoreEvent::UserUpserted { user: user.clone() })?;
                slot.insert(user.clone());
                tracing::info!(%wallet, "user created");
                Ok(user)
            }
        }
    }

    pub fn get_user(&self, wallet: &WalletAddress) -> Result<User, ReservationError> {
        self.users
            .get(wallet)
            .map(|u| u.clone())
            .ok_or_else(|| ReservationError::user_not_found(wallet))
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Apply a partial profile write, creating the user if needed.
    pub fn update_profile(
        &self,
        wallet: &WalletAddress,
        update: ProfileUpdate,
    ) -> Result<User, ReservationError> {
        let entry = self.users.entry(wallet.clone());
        let mut updated = match &entry {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(_) => User::new(wallet.clone(), types::now_nanos()),
        };
        updated.profile.apply(update);

        self.log.append(&StoreEvent::UserUpserted {
            user: updated.clone(),
        })?;
        entry.insert(updated.clone());
        Ok(updated)
    }

    /// Link a Telegram account to a wallet.
    ///
    /// A Telegram id belongs to at most one wallet. Relinking a wallet to a
    /// new Telegram id releases the old one.
    pub fn link_telegram(
        &self,
        wallet: &WalletAddress,
        telegram_id: TelegramId,
        username: Option<String>,
    ) -> Result<User, ReservationError> {
        let released = {
            let index = self.telegram_index.entry(telegram_id);
            if let Entry::Occupied(owner) = &index {
                if owner.get() != wallet {
                    return Err(ReservationError::IdentityConflict {
                        telegram_id: telegram_id.value(),
                    });
                }
            }

            let user = self.users.entry(wallet.clone());
            let mut updated = match &user {
                Entry::Occupied(existing) => existing.get().clone(),
                Entry::Vacant(_) => User::new(wallet.clone(), types::now_nanos()),
            };
            let released = updated.telegram_id.filter(|old| *old != telegram_id);
            updated.telegram_id = Some(telegram_id);
            updated.telegram_username = username.or(updated.telegram_username);

            self.log.append(&StoreEvent::UserUpserted {
                user: updated.clone(),
            })?;
            user.insert(updated);
            index.insert(wallet.clone());
            released
        };

        if let Some(old) = released {
            self.telegram_index.remove_if(&old, |_, owner| owner == wallet);
        }
        tracing::info!(%wallet, %telegram_id, "telegram account linked");
        self.get_user(wallet)
    }

    pub fn find_by_telegram(&self, telegram_id: TelegramId) -> Result<User, ReservationError> {
        let wallet = self
            .telegram_index
            .get(&telegram_id)
            .map(|w| w.clone())
            .ok_or_else(|| ReservationError::user_not_found(telegram_id))?;
        self.get_user(&wallet)
            .ok()
            .filter(|user| user.telegram_id == Some(telegram_id))
            .ok_or_else(|| ReservationError::user_not_found(telegram_id))
    }
}
