use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::crypto::DrawKeypair;
use crate::domain::{Role, UserId};
use crate::entities::users;

const BASE32_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const PIN_KEY_LENGTH: usize = 32;

/// User data returned from repository (without password hash or private key)
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub birthdate: String,
    pub postcode: String,
    pub role: Role,
    pub pin_key: String,
    pub registered_on: String,
    pub current_login: Option<String>,
    pub last_login: Option<String>,
    pub current_ip: Option<String>,
    pub last_ip: Option<String>,
    pub total_logins: i32,
    pub public_key: String,
}

impl TryFrom<users::Model> for User {
    type Error = anyhow::Error;

    fn try_from(model: users::Model) -> Result<Self> {
        let role = model
            .role
            .parse()
            .with_context(|| format!("User {} has an invalid role", model.id))?;

        Ok(Self {
            id: UserId::new(model.id),
            email: model.email,
            firstname: model.firstname,
            lastname: model.lastname,
            phone: model.phone,
            birthdate: model.birthdate,
            postcode: model.postcode,
            role,
            pin_key: model.pin_key,
            registered_on: model.registered_on,
            current_login: model.current_login,
            last_login: model.last_login,
            current_ip: model.current_ip,
            last_ip: model.last_ip,
            total_logins: model.total_logins,
            public_key: model.public_key,
        })
    }
}

/// Fields supplied at registration. The password is plaintext here and is
/// hashed before it reaches the database.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub birthdate: String,
    pub postcode: String,
    pub role: Role,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Hashes the password, generates the draw keypair and inserts the row.
    /// Both steps are CPU heavy and run on the blocking pool.
    pub async fn create(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        let password = new_user.password.clone();
        let hash_config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&hash_config)))
            .await
            .context("Password hashing task panicked")??;

        let bits = config.rsa_key_bits;
        let keypair = task::spawn_blocking(move || DrawKeypair::generate(bits))
            .await
            .context("Key generation task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            email: Set(new_user.email),
            password_hash: Set(password_hash),
            pin_key: Set(generate_pin_key()),
            firstname: Set(new_user.firstname),
            lastname: Set(new_user.lastname),
            phone: Set(new_user.phone),
            birthdate: Set(new_user.birthdate),
            postcode: Set(new_user.postcode),
            role: Set(new_user.role.as_str().to_string()),
            registered_on: Set(now),
            current_login: Set(None),
            last_login: Set(None),
            current_ip: Set(None),
            last_ip: Set(None),
            total_logins: Set(0),
            public_key: Set(keypair.public_pem),
            private_key: Set(keypair.private_pem),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        User::try_from(model)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        user.map(User::try_from).transpose()
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        user.map(User::try_from).transpose()
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("Failed to count users by email")?;

        Ok(count > 0)
    }

    /// Verify password for a user
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Moves the current login stamp to `last_*`, records the new one and
    /// bumps the login counter.
    pub async fn record_login(&self, id: UserId, ip: &str) -> Result<User> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for login update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let now = chrono::Utc::now().to_rfc3339();
        let previous_login = user.current_login.clone();
        let previous_ip = user.current_ip.clone();
        let total_logins = user.total_logins + 1;

        let mut active: users::ActiveModel = user.into();
        active.last_login = Set(previous_login);
        active.last_ip = Set(previous_ip);
        active.current_login = Set(Some(now));
        active.current_ip = Set(Some(ip.to_string()));
        active.total_logins = Set(total_logins);

        let model = active.update(&self.conn).await?;
        User::try_from(model)
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<User>> {
        users::Entity::find()
            .filter(users::Column::Role.eq(role.as_str()))
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users by role")?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    /// PKCS#8 PEM private key used to decrypt the user's draws.
    pub async fn get_private_key(&self, id: UserId) -> Result<Option<String>> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for private key")?;

        Ok(user.map(|u| u.private_key))
    }

    /// Private keys for a set of users, keyed by user id.
    pub async fn get_private_keys(&self, ids: &[UserId]) -> Result<Vec<(UserId, String)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<i32> = ids.iter().map(UserId::value).collect();
        let users = users::Entity::find()
            .filter(users::Column::Id.is_in(raw))
            .all(&self.conn)
            .await
            .context("Failed to query private keys")?;

        Ok(users
            .into_iter()
            .map(|u| (UserId::new(u.id), u.private_key))
            .collect())
    }

    /// Email addresses for a set of users, keyed by user id.
    pub async fn get_emails(&self, ids: &[UserId]) -> Result<Vec<(UserId, String)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<i32> = ids.iter().map(UserId::value).collect();
        let users = users::Entity::find()
            .filter(users::Column::Id.is_in(raw))
            .all(&self.conn)
            .await
            .context("Failed to query user emails")?;

        Ok(users
            .into_iter()
            .map(|u| (UserId::new(u.id), u.email))
            .collect())
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses default params.
pub(crate) fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random base32 TOTP secret
#[must_use]
pub(crate) fn generate_pin_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    (0..PIN_KEY_LENGTH)
        .map(|_| char::from(BASE32_ALPHABET[rng.random_range(0..BASE32_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_key_is_base32() {
        let key = generate_pin_key();
        assert_eq!(key.len(), 32);
        assert!(key.bytes().all(|b| BASE32_ALPHABET.contains(&b)));
        assert_ne!(key, generate_pin_key());
    }

    #[test]
    fn hashed_password_is_not_plaintext() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        let hash = hash_password("Secret1!", Some(&config)).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("Secret1!"));

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"Secret1!", &parsed)
                .is_ok()
        );
    }
}
