use anyhow::{Context, Result};
use colored::Colorize;
use pgstage_pg::connect_postgres;

use crate::config::ProjectConfig;

pub async fn cmd_setup(config: ProjectConfig) -> Result<()> {
    let store = config.checkpoint_store();
    println!("Setting up pgstage checkpoint table...\n");
    println!("  - {} - one cursor per workflow key\n", store.relation());

    let client = connect_postgres(&config.warehouse_connection_string()?)
        .await
        .context("Failed to connect to the warehouse")?;
    store
        .ensure_schema(&client)
        .await
        .context("Failed to create checkpoint table")?;

    println!("{}", "Checkpoint table ready!".green());
    println!("\nNext steps:");
    println!("  1. Run: pgstage run");
    println!("  2. Run: pgstage status\n");
    Ok(())
}
