pub mod cli;
pub mod config;
pub mod crypto;
pub mod db;
pub mod domain;
pub mod entities;
pub mod services;
pub mod state;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{AdminCommands, Cli, Commands, DrawCommands};
pub use config::Config;
pub use state::SharedState;

pub async fn run(config: Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json = config.general.log_json;
    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if matches!(command, Commands::Init) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("config.toml already exists.");
        }
        return Ok(());
    }

    let state = SharedState::new(config).await?;

    match command {
        Commands::Init => Ok(()),

        Commands::Register(form) => cli::cmd_register(&state, form).await,

        Commands::Login {
            credentials,
            postcode,
            ip,
        } => cli::cmd_login(&state, credentials, postcode, ip).await,

        Commands::TwoFactor { credentials } => cli::cmd_two_factor(&state, &credentials).await,

        Commands::Draw {
            credentials,
            command,
        } => match command {
            DrawCommands::Submit { numbers } => {
                cli::cmd_draw_submit(&state, &credentials, &numbers).await
            }
            DrawCommands::List => cli::cmd_draw_list(&state, &credentials).await,
            DrawCommands::Results => cli::cmd_draw_results(&state, &credentials).await,
        },

        Commands::Admin {
            credentials,
            command,
        } => match command {
            AdminCommands::Generate => cli::cmd_admin_generate(&state, &credentials).await,
            AdminCommands::View => cli::cmd_admin_view(&state, &credentials).await,
            AdminCommands::Run => cli::cmd_admin_run(&state, &credentials).await,
            AdminCommands::Users => cli::cmd_admin_users(&state, &credentials).await,
            AdminCommands::Activity => cli::cmd_admin_activity(&state, &credentials).await,
            AdminCommands::Logs { limit } => {
                cli::cmd_admin_logs(&state, &credentials, limit).await
            }
            AdminCommands::RegisterAdmin(form) => {
                cli::cmd_admin_register(&state, &credentials, form).await
            }
        },
    }
}
