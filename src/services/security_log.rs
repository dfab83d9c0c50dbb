use crate::db::{NewSecurityEvent, Store};
use crate::services::auth_service::UserInfo;
use tracing::{error, warn};

/// Security-relevant events worth keeping for admins to review.
#[derive(Debug, Clone)]
pub enum SecurityEvent {
    Registration {
        user: UserInfo,
    },
    Login {
        user: UserInfo,
        ip: String,
    },
    InvalidLogin {
        email: String,
        ip: String,
    },
    UnauthorisedAccess {
        user: UserInfo,
        operation: &'static str,
    },
}

impl SecurityEvent {
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Registration { .. } => "registration",
            Self::Login { .. } => "login",
            Self::InvalidLogin { .. } => "invalid_login",
            Self::UnauthorisedAccess { .. } => "unauthorised_access",
        }
    }

    fn into_row(self) -> NewSecurityEvent {
        let event_type = self.event_type().to_string();
        match self {
            Self::Registration { user } => NewSecurityEvent {
                event_type,
                message: format!("User registration [{}]", user.email),
                user_id: Some(user.id.value()),
                email: Some(user.email),
                role: Some(user.role.to_string()),
                ip: None,
            },
            Self::Login { user, ip } => NewSecurityEvent {
                event_type,
                message: format!("Log in [{}, {ip}]", user.email),
                user_id: Some(user.id.value()),
                email: Some(user.email),
                role: Some(user.role.to_string()),
                ip: Some(ip),
            },
            Self::InvalidLogin { email, ip } => NewSecurityEvent {
                event_type,
                message: format!("Invalid log in attempt [{email}, {ip}]"),
                user_id: None,
                email: Some(email),
                role: None,
                ip: Some(ip),
            },
            Self::UnauthorisedAccess { user, operation } => NewSecurityEvent {
                event_type,
                message: format!(
                    "Unauthorised access to {operation} [{}, {}, {}]",
                    user.id, user.email, user.role
                ),
                user_id: Some(user.id.value()),
                email: Some(user.email),
                role: Some(user.role.to_string()),
                ip: None,
            },
        }
    }
}

/// Writes security events to the `security` tracing target and the
/// `security_events` table.
#[derive(Clone)]
pub struct SecurityLog {
    store: Store,
}

impl SecurityLog {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// A failed write is logged but never fails the operation being audited.
    pub async fn record(&self, event: SecurityEvent) {
        let row = event.into_row();
        warn!(
            target: "security",
            event_type = %row.event_type,
            user_id = ?row.user_id,
            "SECURITY - {}",
            row.message
        );

        if let Err(e) = self.store.add_security_event(row).await {
            error!(error = %e, "Failed to persist security event");
        }
    }
}
