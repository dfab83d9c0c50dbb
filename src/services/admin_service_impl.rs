//! `SeaORM` implementation of the `AdminService` trait.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task;
use tracing::info;

use crate::config::Config;
use crate::crypto::{decrypt_draw, encrypt_draw};
use crate::db::{SecurityEventRow, Store, User};
use crate::domain::{DrawId, DrawNumbers, DrawRules, Role, UserId};
use crate::services::admin_service::{
    AdminError, AdminService, SettlementReport, UserActivity, UserSummary, Winner, WinningDraw,
};
use crate::services::auth_service::{RegisterRequest, UserInfo};
use crate::services::auth_service_impl::create_account;
use crate::services::security_log::{SecurityEvent, SecurityLog};
use crate::services::settlement::compare_draws;

pub struct SeaOrmAdminService {
    store: Store,
    config: Arc<Config>,
    security_log: SecurityLog,
}

impl SeaOrmAdminService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<Config>, security_log: SecurityLog) -> Self {
        Self {
            store,
            config,
            security_log,
        }
    }

    async fn require_admin(
        &self,
        caller: &UserInfo,
        operation: &'static str,
    ) -> Result<(), AdminError> {
        if caller.is_admin() {
            return Ok(());
        }

        self.security_log
            .record(SecurityEvent::UnauthorisedAccess {
                user: caller.clone(),
                operation,
            })
            .await;
        Err(AdminError::Unauthorized)
    }

    async fn private_key(&self, owner: UserId) -> Result<String, AdminError> {
        self.store
            .get_private_key(owner)
            .await?
            .ok_or_else(|| AdminError::Internal(format!("Draw owner {owner} no longer exists")))
    }
}

fn user_summary(user: User) -> UserSummary {
    UserSummary {
        id: user.id,
        email: user.email,
        firstname: user.firstname,
        lastname: user.lastname,
        phone: user.phone,
        role: user.role,
    }
}

fn user_activity(user: User) -> UserActivity {
    UserActivity {
        id: user.id,
        email: user.email,
        registered_on: user.registered_on,
        current_login: user.current_login,
        last_login: user.last_login,
        current_ip: user.current_ip,
        last_ip: user.last_ip,
        total_logins: user.total_logins,
    }
}

/// Builds the winner list. A winner without an account is an error rather
/// than a blank row.
fn attach_emails(
    winners: &[(DrawId, UserId)],
    emails: &HashMap<UserId, String>,
    lottery_round: i32,
    winning_numbers: &str,
) -> Result<Vec<Winner>, AdminError> {
    winners
        .iter()
        .map(|(_, user_id)| {
            let email = emails.get(user_id).cloned().ok_or_else(|| {
                AdminError::Internal(format!("Winning draw owner {user_id} no longer exists"))
            })?;
            Ok(Winner {
                lottery_round,
                numbers: winning_numbers.to_string(),
                user_id: *user_id,
                email,
            })
        })
        .collect()
}

#[async_trait]
impl AdminService for SeaOrmAdminService {
    async fn generate_winning_draw(&self, admin: &UserInfo) -> Result<WinningDraw, AdminError> {
        self.require_admin(admin, "generate winning draw").await?;

        let owner = self
            .store
            .get_user(admin.id)
            .await?
            .ok_or_else(|| AdminError::Internal(format!("Admin {} not found", admin.id)))?;

        let numbers = DrawNumbers::random(&DrawRules::from(&self.config.lottery)).to_string();
        let ciphertext = encrypt_draw(&owner.public_key, &numbers)?;
        let record = self
            .store
            .replace_master_draw(admin.id, ciphertext)
            .await?;

        info!(round = record.lottery_round, draw_id = %record.id, "Generated winning draw");

        Ok(WinningDraw {
            draw_id: record.id,
            lottery_round: record.lottery_round,
            numbers,
            been_played: record.been_played,
        })
    }

    async fn view_winning_draw(&self, admin: &UserInfo) -> Result<WinningDraw, AdminError> {
        self.require_admin(admin, "view winning draw").await?;

        let master = self
            .store
            .unplayed_master_draw()
            .await?
            .ok_or(AdminError::NoWinningDraw)?;

        let private_pem = self.private_key(master.user_id).await?;
        let ciphertext = master.ciphertext.clone();
        let numbers = task::spawn_blocking(move || decrypt_draw(&private_pem, &ciphertext))
            .await
            .map_err(|e| AdminError::Internal(format!("Decryption task panicked: {e}")))??;

        Ok(WinningDraw {
            draw_id: master.id,
            lottery_round: master.lottery_round,
            numbers,
            been_played: master.been_played,
        })
    }

    async fn run_lottery(&self, admin: &UserInfo) -> Result<SettlementReport, AdminError> {
        self.require_admin(admin, "run lottery").await?;

        let master = self
            .store
            .unplayed_master_draw()
            .await?
            .ok_or(AdminError::NoWinningDraw)?;

        let pending = self.store.unplayed_user_draws().await?;
        if pending.is_empty() {
            return Err(AdminError::NoUserDraws);
        }

        let mut owners: Vec<UserId> = pending.iter().map(|d| d.user_id).collect();
        owners.push(master.user_id);
        owners.sort_unstable();
        owners.dedup();

        let private_keys: HashMap<UserId, String> =
            self.store.get_private_keys(&owners).await?.into_iter().collect();

        let master_id = master.id;
        let lottery_round = master.lottery_round;
        let settlement =
            task::spawn_blocking(move || compare_draws(&master, &pending, &private_keys))
                .await
                .map_err(|e| AdminError::Internal(format!("Settlement task panicked: {e}")))??;

        self.store
            .settle_round(master_id, lottery_round, &settlement.outcomes)
            .await?;

        let mut winner_ids: Vec<UserId> = settlement.winners.iter().map(|(_, id)| *id).collect();
        winner_ids.sort_unstable();
        winner_ids.dedup();
        let emails: HashMap<UserId, String> = self
            .store
            .get_user_emails(&winner_ids)
            .await?
            .into_iter()
            .collect();

        let winning_numbers = settlement.winning_numbers.to_string();
        let winners = attach_emails(&settlement.winners, &emails, lottery_round, &winning_numbers)?;

        info!(
            round = lottery_round,
            settled = settlement.outcomes.len(),
            winners = winners.len(),
            "Lottery round settled"
        );

        Ok(SettlementReport {
            lottery_round,
            winning_numbers,
            settled: settlement.outcomes.len(),
            winners,
        })
    }

    async fn view_all_users(&self, admin: &UserInfo) -> Result<Vec<UserSummary>, AdminError> {
        self.require_admin(admin, "view all users").await?;

        let users = self.store.list_users_by_role(Role::User).await?;
        Ok(users.into_iter().map(user_summary).collect())
    }

    async fn user_activity(&self, admin: &UserInfo) -> Result<Vec<UserActivity>, AdminError> {
        self.require_admin(admin, "user activity").await?;

        let users = self.store.list_users_by_role(Role::User).await?;
        Ok(users.into_iter().map(user_activity).collect())
    }

    async fn register_admin(
        &self,
        admin: &UserInfo,
        request: RegisterRequest,
    ) -> Result<UserInfo, AdminError> {
        self.require_admin(admin, "register admin").await?;

        let user = create_account(
            &self.store,
            &self.config,
            &self.security_log,
            &request,
            Role::Admin,
        )
        .await?;

        info!(created_by = %admin.id, user_id = %user.id, "Registered admin account");
        Ok(UserInfo::from(user))
    }

    async fn security_events(
        &self,
        admin: &UserInfo,
        limit: u64,
    ) -> Result<Vec<SecurityEventRow>, AdminError> {
        self.require_admin(admin, "security logs").await?;

        Ok(self.store.recent_security_events(limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winners_get_their_emails() {
        let winners = [
            (DrawId::new(11), UserId::new(2)),
            (DrawId::new(12), UserId::new(3)),
            (DrawId::new(13), UserId::new(2)),
        ];
        let emails = HashMap::from([
            (UserId::new(2), "bob@example.com".to_string()),
            (UserId::new(3), "carol@example.com".to_string()),
        ]);

        let list = attach_emails(&winners, &emails, 4, "1 2 3 4 5 6").unwrap();

        let got: Vec<_> = list.iter().map(|w| (w.user_id, w.email.as_str())).collect();
        assert_eq!(
            got,
            vec![
                (UserId::new(2), "bob@example.com"),
                (UserId::new(3), "carol@example.com"),
                (UserId::new(2), "bob@example.com"),
            ]
        );
        assert!(list.iter().all(|w| w.lottery_round == 4 && w.numbers == "1 2 3 4 5 6"));
    }

    #[test]
    fn winner_without_account_is_an_error() {
        let winners = [(DrawId::new(11), UserId::new(9))];
        let emails = HashMap::from([(UserId::new(2), "bob@example.com".to_string())]);

        let err = attach_emails(&winners, &emails, 1, "1 2 3 4 5 6").unwrap_err();
        assert!(matches!(err, AdminError::Internal(msg) if msg.contains('9')));
    }
}
