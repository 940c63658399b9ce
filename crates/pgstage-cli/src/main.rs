use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod env;
mod loaders;

use cli::{Cli, Commands};
use commands::{cmd_init, cmd_run, cmd_setup, cmd_status};
use config::ProjectConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pgstage=info".parse()?),
        )
        .init();

    env::load_dotenv_from_ancestors(cli.env.as_deref())?;

    match cli.command {
        Commands::Init => cmd_init(&std::env::current_dir()?),
        Commands::Setup => cmd_setup(ProjectConfig::load(&cli.config)?).await,
        Commands::Run { loaders } => cmd_run(ProjectConfig::load(&cli.config)?, &loaders).await,
        Commands::Status => cmd_status(ProjectConfig::load(&cli.config)?).await,
    }
}
