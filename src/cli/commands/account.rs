use crate::cli::{Credentials, RegisterForm};
use crate::services::{AuthError, LoginRequest};
use crate::state::SharedState;

use super::authenticate;

pub async fn cmd_register(state: &SharedState, form: RegisterForm) -> anyhow::Result<()> {
    match state.auth_service.register(form.into()).await {
        Ok(user) => {
            println!("✓ Registered {} (ID: {})", user.email, user.id);
            println!("  Run `lottery two-factor` to set up an authenticator app.");
            Ok(())
        }
        Err(AuthError::Validation(reason)) => {
            println!("✗ {reason}");
            Ok(())
        }
        Err(AuthError::EmailTaken(email)) => {
            println!("✗ Email address already exists: {email}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn cmd_login(
    state: &SharedState,
    credentials: Credentials,
    postcode: String,
    ip: String,
) -> anyhow::Result<()> {
    let request = LoginRequest {
        email: credentials.email,
        password: credentials.password,
        postcode,
        ip,
    };

    let user = match state.auth_service.login(request).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            println!("✗ Please check your login details and try again.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Welcome, {} {} ({})", user.firstname, user.lastname, user.role);
    println!("{:-<50}", "");
    println!(
        "Previous login: {}",
        user.last_login.as_deref().unwrap_or("never")
    );
    println!("Total logins:   {}", user.total_logins);

    Ok(())
}

pub async fn cmd_two_factor(state: &SharedState, credentials: &Credentials) -> anyhow::Result<()> {
    let user = authenticate(state, credentials).await?;
    let uri = state.auth_service.two_factor_uri(&user).await?;

    println!("Add this URI to your authenticator app:");
    println!("{uri}");

    Ok(())
}
