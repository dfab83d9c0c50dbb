//! Domain service for administrator operations.
//!
//! Every method takes the calling user and refuses anyone without the
//! `admin` role.

use serde::Serialize;
use thiserror::Error;

use crate::crypto::CryptoError;
use crate::db::SecurityEventRow;
use crate::domain::{DrawId, Role, UserId};
use crate::services::auth_service::{AuthError, RegisterRequest, UserInfo};
use crate::services::settlement::SettlementError;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("No winning draw has been generated")]
    NoWinningDraw,

    #[error("No user draws are waiting to be played")]
    NoUserDraws,

    #[error("Registration failed: {0}")]
    Registration(#[from] AuthError),

    #[error("Settlement failed: {0}")]
    Settlement(#[from] SettlementError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AdminError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// The current master draw, decrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinningDraw {
    pub draw_id: DrawId,
    pub lottery_round: i32,
    pub numbers: String,
    pub been_played: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Winner {
    pub lottery_round: i32,
    pub numbers: String,
    pub user_id: UserId,
    pub email: String,
}

/// Summary of one settled round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementReport {
    pub lottery_round: i32,
    pub winning_numbers: String,
    /// Number of user draws marked as played.
    pub settled: usize,
    pub winners: Vec<Winner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserActivity {
    pub id: UserId,
    pub email: String,
    pub registered_on: String,
    pub current_login: Option<String>,
    pub last_login: Option<String>,
    pub current_ip: Option<String>,
    pub last_ip: Option<String>,
    pub total_logins: i32,
}

#[async_trait::async_trait]
pub trait AdminService: Send + Sync {
    /// Draws random winning numbers for the next round, replacing any
    /// previous master draw.
    async fn generate_winning_draw(&self, admin: &UserInfo) -> Result<WinningDraw, AdminError>;

    /// # Errors
    ///
    /// Returns [`AdminError::NoWinningDraw`] if there is no unplayed master draw.
    async fn view_winning_draw(&self, admin: &UserInfo) -> Result<WinningDraw, AdminError>;

    /// Settles every pending user draw against the unplayed master draw.
    ///
    /// Nothing is written if any draw fails to decrypt.
    ///
    /// # Errors
    ///
    /// - [`AdminError::NoWinningDraw`] if there is no unplayed master draw
    /// - [`AdminError::NoUserDraws`] if no user draws are waiting
    /// - [`AdminError::Settlement`] if a draw cannot be read
    async fn run_lottery(&self, admin: &UserInfo) -> Result<SettlementReport, AdminError>;

    async fn view_all_users(&self, admin: &UserInfo) -> Result<Vec<UserSummary>, AdminError>;

    async fn user_activity(&self, admin: &UserInfo) -> Result<Vec<UserActivity>, AdminError>;

    /// Registers another account with role `admin`.
    async fn register_admin(
        &self,
        admin: &UserInfo,
        request: RegisterRequest,
    ) -> Result<UserInfo, AdminError>;

    /// Most recent security events, newest first.
    async fn security_events(
        &self,
        admin: &UserInfo,
        limit: u64,
    ) -> Result<Vec<SecurityEventRow>, AdminError>;
}
