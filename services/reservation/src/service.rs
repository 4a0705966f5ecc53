//! Reservation Service
//!
//! Turns raw caller input into domain values, runs store operations on the
//! blocking pool with retries for storage outages, and emits notifications
//! once a reservation has committed.

use crate::error::ServiceError;
use crate::identity::{AcceptAllVerifier, SignatureVerifier};
use crate::notify::{LogNotifier, Notification, NotificationSink};
use crate::retry::RetryPolicy;
use crate::views::{CreateMatchRequest, JoinOutcome, MatchView, ParticipantView};
use match_store::MatchStore;
use std::sync::Arc;
use types::errors::ReservationError;
use types::ids::{MatchId, TelegramId, WalletAddress};
use types::user::{ProfileUpdate, User};

#[derive(Clone)]
pub struct ReservationService {
    store: Arc<MatchStore>,
    notifier: Arc<dyn NotificationSink>,
    verifier: Arc<dyn SignatureVerifier>,
    retry: RetryPolicy,
}

impl ReservationService {
    pub fn new(store: Arc<MatchStore>) -> Self {
        Self {
            store,
            notifier: Arc::new(LogNotifier),
            verifier: Arc::new(AcceptAllVerifier),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &Arc<MatchStore> {
        &self.store
    }

    // ── Matches ─────────────────────────────────────────────────────

    pub async fn create_match(&self, request: CreateMatchRequest) -> Result<MatchView, ServiceError> {
        let new = request.validate()?;

        let organizer = new.organizer.clone();
        self.with_store("upsert_user", move |store| store.upsert_user(&organizer))
            .await?;

        let record = self
            .with_store("create_match", move |store| store.create_match(new.clone()))
            .await?;

        self.notifier
            .notify(Notification::MatchCreated {
                match_id: record.match_id,
                venue: record.venue.clone(),
                organizer: record.organizer.clone(),
                slots_needed: record.slots_needed.get(),
            })
            .await;
        Ok(MatchView::from(&record))
    }

    pub async fn join_match(&self, match_id: &str, user_id: &str) -> Result<JoinOutcome, ServiceError> {
        let match_id: MatchId = match_id.parse()?;
        let wallet = WalletAddress::parse(user_id)?;
        tracing::debug!(%match_id, %wallet, "join requested");

        // Unknown matches are rejected before a user record is created
        self.with_store("get_match", move |store| store.get_match(match_id))
            .await?;

        let user = wallet.clone();
        self.with_store("upsert_user", move |store| store.upsert_user(&user))
            .await?;

        let joiner = wallet.clone();
        let record = self
            .with_store("join_match", move |store| store.join_match(match_id, &joiner))
            .await?;

        self.notifier
            .notify(Notification::PlayerJoined {
                match_id,
                wallet,
                current_players: record.current_players,
                slots_needed: record.slots_needed.get(),
            })
            .await;
        Ok(JoinOutcome::from(&record))
    }

    pub async fn list_matches(&self) -> Result<Vec<MatchView>, ServiceError> {
        let matches = self
            .with_store("list_matches", |store| Ok(store.list_matches()))
            .await?;
        Ok(matches.iter().map(MatchView::from).collect())
    }

    pub async fn get_match(&self, match_id: &str) -> Result<MatchView, ServiceError> {
        let match_id: MatchId = match_id.parse()?;
        let record = self
            .with_store("get_match", move |store| store.get_match(match_id))
            .await?;
        Ok(MatchView::from(&record))
    }

    pub async fn participants(&self, match_id: &str) -> Result<Vec<ParticipantView>, ServiceError> {
        let match_id: MatchId = match_id.parse()?;
        let participants = self
            .with_store("participants", move |store| store.participants(match_id))
            .await?;
        Ok(participants.into_iter().map(ParticipantView::from).collect())
    }

    pub async fn match_count(&self) -> Result<usize, ServiceError> {
        self.with_store("match_count", |store| Ok(store.match_count()))
            .await
    }

    // ── Users ───────────────────────────────────────────────────────

    /// Verify a wallet signature and return the (possibly new) user.
    pub async fn authenticate_wallet(
        &self,
        wallet_address: &str,
        message: &str,
        signature: &str,
    ) -> Result<User, ServiceError> {
        let wallet = WalletAddress::parse(wallet_address)?;
        if !self.verifier.verify(&wallet, message, signature) {
            tracing::warn!(%wallet, "wallet signature rejected");
            return Err(ServiceError::InvalidSignature(wallet.to_string()));
        }
        let user = self
            .with_store("upsert_user", move |store| store.upsert_user(&wallet))
            .await?;
        tracing::info!(wallet = %user.wallet_address, "wallet authenticated");
        Ok(user)
    }

    pub async fn get_profile(&self, wallet: &WalletAddress) -> Result<User, ServiceError> {
        let wallet = wallet.clone();
        self.with_store("get_user", move |store| store.get_user(&wallet))
            .await
    }

    pub async fn update_profile(
        &self,
        wallet: &WalletAddress,
        update: ProfileUpdate,
    ) -> Result<User, ServiceError> {
        let wallet = wallet.clone();
        self.with_store("update_profile", move |store| {
            store.update_profile(&wallet, update.clone())
        })
        .await
    }

    pub async fn link_telegram(
        &self,
        wallet: &WalletAddress,
        telegram_id: i64,
        username: Option<String>,
    ) -> Result<User, ServiceError> {
        let telegram_id = TelegramId::new(telegram_id)?;
        let username = username
            .map(|u| u.trim().trim_start_matches('@').to_string())
            .filter(|u| !u.is_empty());
        let wallet = wallet.clone();
        self.with_store("link_telegram", move |store| {
            store.link_telegram(&wallet, telegram_id, username.clone())
        })
        .await
    }

    /// Run a store call on the blocking pool under the retry policy.
    ///
    /// Each attempt is a complete store operation, so dropping the returned
    /// future never leaves a half-applied mutation behind.
    async fn with_store<T, F>(&self, operation: &'static str, f: F) -> Result<T, ServiceError>
    where
        F: Fn(&MatchStore) -> Result<T, ReservationError> + Send + Sync + 'static,
        T: Send + 'static,
    {
        let f = Arc::new(f);
        self.retry
            .run(operation, || {
                let store = Arc::clone(&self.store);
                let f = Arc::clone(&f);
                async move {
                    tokio::task::spawn_blocking(move || f(&*store))
                        .await
                        .map_err(|e| ServiceError::Worker(e.to_string()))?
                        .map_err(ServiceError::from)
                }
            })
            .await
    }
}
