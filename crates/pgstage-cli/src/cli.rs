use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pgstage")]
#[command(about = "Checkpointed incremental loads into a Postgres warehouse")]
#[command(version)]
pub struct Cli {
    /// Environment to load (loads .env.{ENV} instead of .env)
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Path to the project config file
    #[arg(short, long, global = true, default_value = "pgstage.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create pgstage.toml and .env.example in the current directory
    Init,

    /// Create the checkpoint table in the warehouse
    Setup,

    /// Run one batch of each named loader (all configured loaders if none given)
    Run {
        /// Loader names from pgstage.toml
        loaders: Vec<String>,
    },

    /// Show the stored cursor of every workflow
    Status,
}
