//! Domain service for a user's own draws.

use serde::Serialize;
use thiserror::Error;

use crate::crypto::CryptoError;
use crate::domain::{DomainError, DrawId};
use crate::services::auth_service::UserInfo;

#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("Invalid draw: {0}")]
    InvalidNumbers(#[from] DomainError),

    #[error("User not found")]
    UserNotFound,

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for LotteryError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for LotteryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A draw decrypted for its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawView {
    pub id: DrawId,
    pub numbers: String,
    pub been_played: bool,
    pub matches_master: bool,
    pub lottery_round: i32,
    pub created_at: String,
}

#[async_trait::async_trait]
pub trait LotteryService: Send + Sync {
    /// Validates the picks, encrypts them under the user's public key and
    /// stores them as an unplayed draw.
    ///
    /// # Errors
    ///
    /// Returns [`LotteryError::InvalidNumbers`] if the picks break the draw rules.
    async fn submit_draw(&self, user: &UserInfo, numbers: &str) -> Result<DrawView, LotteryError>;

    /// The user's draws still waiting for settlement.
    async fn view_draws(&self, user: &UserInfo) -> Result<Vec<DrawView>, LotteryError>;

    /// The user's settled draws with their outcome.
    async fn check_results(&self, user: &UserInfo) -> Result<Vec<DrawView>, LotteryError>;
}
