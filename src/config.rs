use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Largest plaintext PKCS#1 v1.5 can carry is the modulus size minus this padding.
const PKCS1V15_OVERHEAD: usize = 11;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub security: SecurityConfig,

    pub lottery: LotteryConfig,

    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/lottery.db".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Modulus size of the per-user RSA keypair used to encrypt draws.
    pub rsa_key_bits: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            rsa_key_bits: 2048,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    pub numbers_per_draw: usize,

    pub min_number: u8,

    pub max_number: u8,

    /// Issuer shown by authenticator apps for the 2FA provisioning URI.
    pub totp_issuer: String,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            numbers_per_draw: 6,
            min_number: 1,
            max_number: 59,
            totp_issuer: "Lottery".to_string(),
        }
    }
}

/// Admin account created on first start when its email is not registered yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub enabled: bool,
    pub admin_email: String,
    pub admin_password: String,
    pub firstname: String,
    pub lastname: String,
    pub birthdate: String,
    pub phone: String,
    pub postcode: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_email: "admin@email.com".to_string(),
            admin_password: "Admin1!".to_string(),
            firstname: "Alice".to_string(),
            lastname: "Jones".to_string(),
            birthdate: "11/11/2000".to_string(),
            phone: "0191-123-4567".to_string(),
            postcode: "NE1 4SP".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // A missing .env is the normal case.
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("LOTTERY_DATABASE_PATH")
            && !path.is_empty()
        {
            self.general.database_path = path;
        }

        if let Ok(level) = std::env::var("LOTTERY_LOG_LEVEL")
            && !level.is_empty()
        {
            self.general.log_level = level;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("lottery").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".lottery").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        let bits = self.security.rsa_key_bits;
        if !(1024..=4096).contains(&bits) {
            anyhow::bail!("RSA key size must be between 1024 and 4096 bits, got {bits}");
        }

        let lottery = &self.lottery;
        if lottery.numbers_per_draw == 0 {
            anyhow::bail!("A draw must contain at least one number");
        }

        if lottery.min_number == 0 || lottery.min_number > lottery.max_number {
            anyhow::bail!(
                "Invalid number range {}..={}",
                lottery.min_number,
                lottery.max_number
            );
        }

        let available = usize::from(lottery.max_number - lottery.min_number) + 1;
        if available < lottery.numbers_per_draw {
            anyhow::bail!(
                "Range {}..={} cannot supply {} distinct numbers",
                lottery.min_number,
                lottery.max_number,
                lottery.numbers_per_draw
            );
        }

        // "NNN " per number is the worst case for the canonical string.
        let longest_draw = lottery.numbers_per_draw * 4;
        if longest_draw > bits / 8 - PKCS1V15_OVERHEAD {
            anyhow::bail!(
                "A draw of {} numbers does not fit a {bits}-bit RSA block",
                lottery.numbers_per_draw
            );
        }

        Ok(())
    }
}
