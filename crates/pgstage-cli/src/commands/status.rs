use anyhow::{Context, Result};
use colored::Colorize;
use pgstage_core::{Transaction, Warehouse};
use pgstage_pg::PgWarehouse;

use crate::config::ProjectConfig;

pub async fn cmd_status(config: ProjectConfig) -> Result<()> {
    let definitions = config.definitions()?;
    let store = config.checkpoint_store();
    let warehouse = PgWarehouse::new(config.warehouse_connection_string()?);

    let mut tx = warehouse
        .begin()
        .await
        .context("Failed to connect to the warehouse")?;
    let listed = store.list(&mut tx).await;
    tx.rollback().await?;
    let checkpoints = listed?;

    println!("\nWorkflow Status:");
    println!("{:<45} {:>12}  {}", "Workflow", "Cursor", "Loader");
    println!("{:-<80}", "");

    for checkpoint in &checkpoints {
        let loader = definitions
            .iter()
            .find(|d| d.workflow_key == checkpoint.workflow_key)
            .map(|d| d.name.as_str())
            .unwrap_or("-");
        let cursor = match checkpoint.cursor() {
            Ok(cursor) => format!("{:>12}", cursor),
            Err(_) => format!("{:>12}", "invalid").red().to_string(),
        };
        println!("{:<45} {}  {}", checkpoint.workflow_key, cursor, loader);
    }

    for def in &definitions {
        if !checkpoints.iter().any(|c| c.workflow_key == def.workflow_key) {
            println!(
                "{:<45} {}  {}",
                def.workflow_key,
                format!("{:>12}", "not started").yellow(),
                def.name
            );
        }
    }

    println!();
    Ok(())
}
