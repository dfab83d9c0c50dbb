//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{BootstrapConfig, Config};
use crate::db::{NewUser, Store, User};
use crate::domain::Role;
use crate::services::auth_service::{
    AuthError, AuthService, LoginRequest, RegisterRequest, UserInfo,
};
use crate::services::security_log::{SecurityEvent, SecurityLog};
use crate::services::validation::validate_registration;

pub struct SeaOrmAuthService {
    store: Store,
    config: Arc<Config>,
    security_log: SecurityLog,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<Config>, security_log: SecurityLog) -> Self {
        Self {
            store,
            config,
            security_log,
        }
    }

    async fn reject_login(&self, email: &str, ip: &str) -> AuthError {
        self.security_log
            .record(SecurityEvent::InvalidLogin {
                email: email.to_string(),
                ip: ip.to_string(),
            })
            .await;
        AuthError::InvalidCredentials
    }
}

/// Validates the form, rejects duplicate emails and stores the account with
/// a fresh keypair. Shared by self-registration and admin registration.
pub(crate) async fn create_account(
    store: &Store,
    config: &Config,
    security_log: &SecurityLog,
    request: &RegisterRequest,
    role: Role,
) -> Result<User, AuthError> {
    let form = validate_registration(request)?;

    if store.email_exists(&form.email).await? {
        return Err(AuthError::EmailTaken(form.email));
    }

    let user = store
        .create_user(
            NewUser {
                email: form.email,
                password: form.password,
                firstname: form.firstname,
                lastname: form.lastname,
                phone: form.phone,
                birthdate: form.birthdate,
                postcode: form.postcode,
                role,
            },
            &config.security,
        )
        .await?;

    info!(user_id = %user.id, role = %user.role, "Registered account");
    security_log
        .record(SecurityEvent::Registration {
            user: UserInfo::from(user.clone()),
        })
        .await;

    Ok(user)
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, request: RegisterRequest) -> Result<UserInfo, AuthError> {
        let user = create_account(
            &self.store,
            &self.config,
            &self.security_log,
            &request,
            Role::User,
        )
        .await?;

        Ok(UserInfo::from(user))
    }

    async fn login(&self, request: LoginRequest) -> Result<UserInfo, AuthError> {
        let email = request.email.trim();

        let is_valid = self
            .store
            .verify_user_password(email, &request.password)
            .await?;

        if !is_valid {
            return Err(self.reject_login(email, &request.ip).await);
        }

        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.postcode.trim() != request.postcode.trim() {
            return Err(self.reject_login(email, &request.ip).await);
        }

        let user = UserInfo::from(self.store.record_login(user.id, &request.ip).await?);

        self.security_log
            .record(SecurityEvent::Login {
                user: user.clone(),
                ip: request.ip,
            })
            .await;

        Ok(user)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        let email = email.trim();

        if !self.store.verify_user_password(email, password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserInfo::from(user))
    }

    async fn two_factor_uri(&self, user: &UserInfo) -> Result<String, AuthError> {
        let stored = self
            .store
            .get_user(user.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let issuer = urlencoding::encode(&self.config.lottery.totp_issuer);
        let email = urlencoding::encode(&stored.email);

        Ok(format!(
            "otpauth://totp/{issuer}:{email}?secret={}&issuer={issuer}",
            stored.pin_key
        ))
    }

    async fn bootstrap_admin(&self, config: &BootstrapConfig) -> Result<bool, AuthError> {
        if self.store.email_exists(config.admin_email.trim()).await? {
            return Ok(false);
        }

        let request = RegisterRequest::from(config);
        create_account(
            &self.store,
            &self.config,
            &self.security_log,
            &request,
            Role::Admin,
        )
        .await?;

        info!("Created bootstrap admin account {}", config.admin_email);
        Ok(true)
    }
}
