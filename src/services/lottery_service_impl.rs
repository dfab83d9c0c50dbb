//! `SeaORM` implementation of the `LotteryService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task;
use tracing::{debug, info};

use crate::config::Config;
use crate::crypto::{self, encrypt_draw};
use crate::db::{DrawRecord, Store};
use crate::domain::{DrawNumbers, DrawRules};
use crate::services::auth_service::UserInfo;
use crate::services::lottery_service::{DrawView, LotteryError, LotteryService};

pub struct SeaOrmLotteryService {
    store: Store,
    config: Arc<Config>,
}

impl SeaOrmLotteryService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    async fn decrypted_draws(
        &self,
        user: &UserInfo,
        played: bool,
    ) -> Result<Vec<DrawView>, LotteryError> {
        let draws = self.store.draws_for_user(user.id, played).await?;
        if draws.is_empty() {
            return Ok(Vec::new());
        }

        let private_pem = self
            .store
            .get_private_key(user.id)
            .await?
            .ok_or(LotteryError::UserNotFound)?;

        task::spawn_blocking(move || decrypt_all(&private_pem, draws))
            .await
            .map_err(|e| LotteryError::Internal(format!("Decryption task panicked: {e}")))?
    }
}

fn decrypt_all(private_pem: &str, draws: Vec<DrawRecord>) -> Result<Vec<DrawView>, LotteryError> {
    let private_key = crypto::parse_private_key(private_pem)?;

    draws
        .into_iter()
        .map(|draw| {
            let numbers = crypto::decrypt_with(&private_key, &draw.ciphertext)?;
            Ok(DrawView {
                id: draw.id,
                numbers,
                been_played: draw.been_played,
                matches_master: draw.matches_master,
                lottery_round: draw.lottery_round,
                created_at: draw.created_at,
            })
        })
        .collect()
}

#[async_trait]
impl LotteryService for SeaOrmLotteryService {
    async fn submit_draw(&self, user: &UserInfo, numbers: &str) -> Result<DrawView, LotteryError> {
        let rules = DrawRules::from(&self.config.lottery);
        let numbers = DrawNumbers::parse(numbers, &rules)?;

        let owner = self
            .store
            .get_user(user.id)
            .await?
            .ok_or(LotteryError::UserNotFound)?;

        let plaintext = numbers.to_string();
        let ciphertext = encrypt_draw(&owner.public_key, &plaintext)?;
        let record = self.store.insert_user_draw(user.id, ciphertext).await?;

        info!(user_id = %user.id, draw_id = %record.id, "Draw submitted");

        Ok(DrawView {
            id: record.id,
            numbers: plaintext,
            been_played: record.been_played,
            matches_master: record.matches_master,
            lottery_round: record.lottery_round,
            created_at: record.created_at,
        })
    }

    async fn view_draws(&self, user: &UserInfo) -> Result<Vec<DrawView>, LotteryError> {
        let draws = self.decrypted_draws(user, false).await?;
        debug!(user_id = %user.id, count = draws.len(), "Listed playable draws");
        Ok(draws)
    }

    async fn check_results(&self, user: &UserInfo) -> Result<Vec<DrawView>, LotteryError> {
        let draws = self.decrypted_draws(user, true).await?;
        debug!(user_id = %user.id, count = draws.len(), "Listed played draws");
        Ok(draws)
    }
}
