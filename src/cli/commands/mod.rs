mod account;
mod admin;
mod draw;

pub use account::{cmd_login, cmd_register, cmd_two_factor};
pub use admin::{
    cmd_admin_activity, cmd_admin_generate, cmd_admin_logs, cmd_admin_register, cmd_admin_run,
    cmd_admin_users, cmd_admin_view,
};
pub use draw::{cmd_draw_list, cmd_draw_results, cmd_draw_submit};

use crate::cli::Credentials;
use crate::services::UserInfo;
use crate::state::SharedState;

/// Resolves the acting user for a command without counting it as a login.
async fn authenticate(state: &SharedState, credentials: &Credentials) -> anyhow::Result<UserInfo> {
    let user = state
        .auth_service
        .authenticate(&credentials.email, &credentials.password)
        .await?;
    Ok(user)
}
