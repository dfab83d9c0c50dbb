use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AdminService, AuthService, LotteryService, SeaOrmAdminService, SeaOrmAuthService,
    SeaOrmLotteryService, SecurityLog,
};

/// Everything a command needs: configuration, the store, and the services
/// built on top of it.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub security_log: SecurityLog,

    pub auth_service: Arc<dyn AuthService>,

    pub lottery_service: Arc<dyn LotteryService>,

    pub admin_service: Arc<dyn AdminService>,
}

impl SharedState {
    /// Opens the database, runs migrations and creates the bootstrap admin
    /// when enabled.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let config = Arc::new(config);
        let security_log = SecurityLog::new(store.clone());

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.clone(),
            security_log.clone(),
        )) as Arc<dyn AuthService>;

        let lottery_service = Arc::new(SeaOrmLotteryService::new(store.clone(), config.clone()))
            as Arc<dyn LotteryService>;

        let admin_service = Arc::new(SeaOrmAdminService::new(
            store.clone(),
            config.clone(),
            security_log.clone(),
        )) as Arc<dyn AdminService>;

        if config.bootstrap.enabled {
            auth_service.bootstrap_admin(&config.bootstrap).await?;
        } else {
            debug!("Bootstrap admin disabled");
        }

        Ok(Self {
            config,
            store,
            security_log,
            auth_service,
            lottery_service,
            admin_service,
        })
    }
}
