//! Domain service for registration and authentication.
//!
//! Handles account creation, login with audit bookkeeping, credential checks
//! for follow-up commands, and the 2FA provisioning URI.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BootstrapConfig;
use crate::crypto::CryptoError;
use crate::db::User;
use crate::domain::{Role, UserId};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email address already exists: {0}")]
    EmailTaken(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Registration form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub birthdate: String,
    pub postcode: String,
}

impl From<&BootstrapConfig> for RegisterRequest {
    fn from(config: &BootstrapConfig) -> Self {
        Self {
            email: config.admin_email.clone(),
            password: config.admin_password.clone(),
            confirm_password: config.admin_password.clone(),
            firstname: config.firstname.clone(),
            lastname: config.lastname.clone(),
            phone: config.phone.clone(),
            birthdate: config.birthdate.clone(),
            postcode: config.postcode.clone(),
        }
    }
}

/// Login form. `ip` is the address the attempt came from.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub postcode: String,
    pub ip: String,
}

/// Authenticated caller, passed to every operation that acts as a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub id: UserId,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub role: Role,
    pub current_login: Option<String>,
    pub last_login: Option<String>,
    pub total_logins: i32,
}

impl UserInfo {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            firstname: user.firstname,
            lastname: user.lastname,
            role: user.role,
            current_login: user.current_login,
            last_login: user.last_login,
            total_logins: user.total_logins,
        }
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Registers a new account with role `user`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] if a form field is invalid
    /// - [`AuthError::EmailTaken`] if the email is already registered
    async fn register(&self, request: RegisterRequest) -> Result<UserInfo, AuthError>;

    /// Verifies email, password and postcode, then records the login.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if any check fails.
    async fn login(&self, request: LoginRequest) -> Result<UserInfo, AuthError>;

    /// Verifies email and password without touching the login audit fields.
    async fn authenticate(&self, email: &str, password: &str) -> Result<UserInfo, AuthError>;

    /// `otpauth://` URI for enrolling the account in an authenticator app.
    async fn two_factor_uri(&self, user: &UserInfo) -> Result<String, AuthError>;

    /// Creates the configured admin account unless its email already exists.
    /// Returns whether an account was created.
    async fn bootstrap_admin(&self, config: &BootstrapConfig) -> Result<bool, AuthError>;
}
