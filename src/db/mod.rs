use crate::config::SecurityConfig;
use crate::domain::{DrawId, Role, UserId};
use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::draw::{DrawOutcome, DrawRecord};
pub use repositories::security_event::{NewSecurityEvent, SecurityEventRow};
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn draw_repo(&self) -> repositories::draw::DrawRepository {
        repositories::draw::DrawRepository::new(self.conn.clone())
    }

    fn security_event_repo(&self) -> repositories::security_event::SecurityEventRepository {
        repositories::security_event::SecurityEventRepository::new(self.conn.clone())
    }

    pub async fn create_user(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, config).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn record_login(&self, id: UserId, ip: &str) -> Result<User> {
        self.user_repo().record_login(id, ip).await
    }

    pub async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>> {
        self.user_repo().list_by_role(role).await
    }

    pub async fn get_private_key(&self, id: UserId) -> Result<Option<String>> {
        self.user_repo().get_private_key(id).await
    }

    pub async fn get_private_keys(&self, ids: &[UserId]) -> Result<Vec<(UserId, String)>> {
        self.user_repo().get_private_keys(ids).await
    }

    pub async fn get_user_emails(&self, ids: &[UserId]) -> Result<Vec<(UserId, String)>> {
        self.user_repo().get_emails(ids).await
    }

    pub async fn insert_user_draw(&self, user_id: UserId, ciphertext: Vec<u8>) -> Result<DrawRecord> {
        self.draw_repo().insert_user_draw(user_id, ciphertext).await
    }

    pub async fn unplayed_master_draw(&self) -> Result<Option<DrawRecord>> {
        self.draw_repo().unplayed_master().await
    }

    pub async fn replace_master_draw(&self, owner: UserId, ciphertext: Vec<u8>) -> Result<DrawRecord> {
        self.draw_repo().replace_master(owner, ciphertext).await
    }

    pub async fn unplayed_user_draws(&self) -> Result<Vec<DrawRecord>> {
        self.draw_repo().unplayed_user_draws().await
    }

    pub async fn draws_for_user(&self, user_id: UserId, played: bool) -> Result<Vec<DrawRecord>> {
        self.draw_repo().for_user(user_id, played).await
    }

    pub async fn settle_round(
        &self,
        master_id: DrawId,
        lottery_round: i32,
        outcomes: &[DrawOutcome],
    ) -> Result<()> {
        self.draw_repo()
            .settle(master_id, lottery_round, outcomes)
            .await
    }

    pub async fn add_security_event(&self, event: NewSecurityEvent) -> Result<()> {
        self.security_event_repo().add(event).await
    }

    pub async fn recent_security_events(&self, limit: u64) -> Result<Vec<SecurityEventRow>> {
        self.security_event_repo().recent(limit).await
    }

    pub async fn security_events_by_type(&self, event_type: &str) -> Result<Vec<SecurityEventRow>> {
        self.security_event_repo().by_type(event_type).await
    }
}
