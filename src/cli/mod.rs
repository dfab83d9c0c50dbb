//! CLI module - Command-line interface for the lottery
//!
//! Every command that acts as a user takes credentials from flags or from
//! `LOTTERY_EMAIL` / `LOTTERY_PASSWORD`.

mod commands;

use clap::{Args, Parser, Subcommand};

use crate::services::RegisterRequest;

/// Lottery - encrypted number draws with admin-run settlement
#[derive(Parser)]
#[command(name = "lottery")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
pub struct Credentials {
    /// Account email
    #[arg(long, env = "LOTTERY_EMAIL")]
    pub email: String,

    /// Account password
    #[arg(long, env = "LOTTERY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterForm {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    /// Must match --password
    #[arg(long)]
    pub confirm_password: String,

    #[arg(long)]
    pub firstname: String,

    #[arg(long)]
    pub lastname: String,

    /// Format XXXX-XXX-XXXX
    #[arg(long)]
    pub phone: String,

    /// Format DD/MM/YYYY
    #[arg(long)]
    pub birthdate: String,

    #[arg(long)]
    pub postcode: String,
}

impl From<RegisterForm> for RegisterRequest {
    fn from(form: RegisterForm) -> Self {
        Self {
            email: form.email,
            password: form.password,
            confirm_password: form.confirm_password,
            firstname: form.firstname,
            lastname: form.lastname,
            phone: form.phone,
            birthdate: form.birthdate,
            postcode: form.postcode,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Register a new user account
    Register(RegisterForm),

    /// Log in and record the login
    Login {
        #[command(flatten)]
        credentials: Credentials,

        /// Postcode given at registration
        #[arg(long)]
        postcode: String,

        /// Address recorded for this login
        #[arg(long, default_value = "127.0.0.1")]
        ip: String,
    },

    /// Print the otpauth:// URI for an authenticator app
    #[command(alias = "2fa")]
    TwoFactor {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Submit and review your draws
    Draw {
        #[command(flatten)]
        credentials: Credentials,

        #[command(subcommand)]
        command: DrawCommands,
    },

    /// Administrator commands
    Admin {
        #[command(flatten)]
        credentials: Credentials,

        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
pub enum DrawCommands {
    /// Submit a new draw
    Submit {
        /// Numbers, separated by spaces or commas
        #[arg(required = true, num_args = 1..)]
        numbers: Vec<String>,
    },
    /// Show draws waiting to be played
    #[command(alias = "ls")]
    List,
    /// Show played draws and whether they won
    Results,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Generate winning numbers for the next round
    Generate,
    /// Show the current winning numbers
    View,
    /// Settle all pending draws against the winning numbers
    Run,
    /// List registered users
    Users,
    /// Show login activity of registered users
    Activity,
    /// Show recent security events
    Logs {
        /// Number of events to show
        #[arg(default_value = "10")]
        limit: u64,
    },
    /// Register another administrator
    RegisterAdmin(RegisterForm),
}

pub use commands::*;
