use crate::cli::{Credentials, RegisterForm};
use crate::services::{AdminError, UserInfo};
use crate::state::SharedState;

use super::authenticate;

/// Prints expected refusals instead of failing the process.
fn report(result: Result<(), AdminError>) -> anyhow::Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(AdminError::Unauthorized) => {
            println!("✗ This command requires an administrator account.");
            Ok(())
        }
        Err(AdminError::NoWinningDraw) => {
            println!("No winning draw. Generate one with: lottery admin generate");
            Ok(())
        }
        Err(AdminError::NoUserDraws) => {
            println!("No user draws are waiting to be played.");
            Ok(())
        }
        Err(AdminError::Registration(reason)) => {
            println!("✗ {reason}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn generate(state: &SharedState, admin: &UserInfo) -> Result<(), AdminError> {
    let draw = state.admin_service.generate_winning_draw(admin).await?;
    println!(
        "✓ Round {} winning numbers generated: {}",
        draw.lottery_round, draw.numbers
    );
    Ok(())
}

pub async fn cmd_admin_generate(state: &SharedState, credentials: &Credentials) -> anyhow::Result<()> {
    let admin = authenticate(state, credentials).await?;
    report(generate(state, &admin).await)
}

async fn view(state: &SharedState, admin: &UserInfo) -> Result<(), AdminError> {
    let draw = state.admin_service.view_winning_draw(admin).await?;
    println!("Round {}: {}", draw.lottery_round, draw.numbers);
    Ok(())
}

pub async fn cmd_admin_view(state: &SharedState, credentials: &Credentials) -> anyhow::Result<()> {
    let admin = authenticate(state, credentials).await?;
    report(view(state, &admin).await)
}

async fn run(state: &SharedState, admin: &UserInfo) -> Result<(), AdminError> {
    let result = state.admin_service.run_lottery(admin).await?;

    println!("Round {} settled", result.lottery_round);
    println!("{:-<50}", "");
    println!("Winning numbers: {}", result.winning_numbers);
    println!("Draws played:    {}", result.settled);

    if result.winners.is_empty() {
        println!("No winners this round.");
    } else {
        println!("Winners:");
        for winner in &result.winners {
            println!("• {} (ID: {})", winner.email, winner.user_id);
        }
    }
    Ok(())
}

pub async fn cmd_admin_run(state: &SharedState, credentials: &Credentials) -> anyhow::Result<()> {
    let admin = authenticate(state, credentials).await?;
    report(run(state, &admin).await)
}

async fn users(state: &SharedState, admin: &UserInfo) -> Result<(), AdminError> {
    let users = state.admin_service.view_all_users(admin).await?;
    if users.is_empty() {
        println!("No registered users.");
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<70}", "");
    for user in users {
        println!("• {} {} <{}>", user.firstname, user.lastname, user.email);
        println!("  ID: {} | Phone: {} | Role: {}", user.id, user.phone, user.role);
    }
    Ok(())
}

pub async fn cmd_admin_users(state: &SharedState, credentials: &Credentials) -> anyhow::Result<()> {
    let admin = authenticate(state, credentials).await?;
    report(users(state, &admin).await)
}

async fn activity(state: &SharedState, admin: &UserInfo) -> Result<(), AdminError> {
    let users = state.admin_service.user_activity(admin).await?;
    if users.is_empty() {
        println!("No registered users.");
        return Ok(());
    }

    println!("User Activity");
    println!("{:-<70}", "");
    for user in users {
        let current = user.current_login.as_deref().unwrap_or("never");
        let last = user.last_login.as_deref().unwrap_or("never");
        println!("• {} (ID: {}) - {} logins", user.email, user.id, user.total_logins);
        println!("  Registered: {}", user.registered_on);
        println!(
            "  Current: {current} from {}",
            user.current_ip.as_deref().unwrap_or("-")
        );
        println!("  Last:    {last} from {}", user.last_ip.as_deref().unwrap_or("-"));
    }
    Ok(())
}

pub async fn cmd_admin_activity(state: &SharedState, credentials: &Credentials) -> anyhow::Result<()> {
    let admin = authenticate(state, credentials).await?;
    report(activity(state, &admin).await)
}

async fn logs(state: &SharedState, admin: &UserInfo, limit: u64) -> Result<(), AdminError> {
    let events = state.admin_service.security_events(admin, limit).await?;
    if events.is_empty() {
        println!("No security events.");
        return Ok(());
    }

    println!("Security Events (last {}):", events.len());
    println!("{:-<70}", "");
    for event in events {
        println!("{} | {:<20} | {}", event.created_at, event.event_type, event.message);
    }
    Ok(())
}

pub async fn cmd_admin_logs(
    state: &SharedState,
    credentials: &Credentials,
    limit: u64,
) -> anyhow::Result<()> {
    let admin = authenticate(state, credentials).await?;
    report(logs(state, &admin, limit).await)
}

async fn register(state: &SharedState, admin: &UserInfo, form: RegisterForm) -> Result<(), AdminError> {
    let user = state
        .admin_service
        .register_admin(admin, form.into())
        .await?;
    println!("✓ Registered administrator {} (ID: {})", user.email, user.id);
    Ok(())
}

pub async fn cmd_admin_register(
    state: &SharedState,
    credentials: &Credentials,
    form: RegisterForm,
) -> anyhow::Result<()> {
    let admin = authenticate(state, credentials).await?;
    report(register(state, &admin, form).await)
}
