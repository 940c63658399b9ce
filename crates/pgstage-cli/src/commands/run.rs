use anyhow::{bail, Result};
use colored::Colorize;
use pgstage_core::LoaderDefinition;
use pgstage_pg::PgWarehouse;
use tracing::{error, info};

use crate::config::ProjectConfig;
use crate::loaders::{run_loader, RunContext};

/// Pick the loaders to run, in the order given. No names means all of them.
pub fn select<'a>(
    definitions: &'a [LoaderDefinition],
    names: &[String],
) -> Result<Vec<&'a LoaderDefinition>> {
    if names.is_empty() {
        return Ok(definitions.iter().collect());
    }

    names
        .iter()
        .map(|name| {
            definitions
                .iter()
                .find(|d| &d.name == name)
                .ok_or_else(|| anyhow::anyhow!("Unknown loader '{}'", name))
        })
        .collect()
}

/// Run one batch of each selected loader.
///
/// Loaders run one after another, each in its own transaction. A failing
/// loader does not stop the rest, but the command fails if any did.
pub async fn cmd_run(config: ProjectConfig, names: &[String]) -> Result<()> {
    let definitions = config.definitions()?;
    let selected = select(&definitions, names)?;
    if selected.is_empty() {
        println!("No loaders configured in pgstage.toml");
        return Ok(());
    }

    let ctx = RunContext {
        warehouse: PgWarehouse::new(config.warehouse_connection_string()?),
        origin: config.origin_connection_string()?,
        api: config.api_config()?,
        checkpoints: config.checkpoint_store(),
    };

    info!(count = selected.len(), "Running loaders");

    let mut failed = Vec::new();
    for def in selected {
        match run_loader(&ctx, def).await {
            Ok(outcome) if outcome.is_empty() => {
                println!("{} {}: nothing new", "-".dimmed(), def.name);
            }
            Ok(outcome) => {
                println!(
                    "{} {}: loaded {} (cursor {} -> {})",
                    "✓".green(),
                    def.name,
                    outcome.loaded,
                    outcome.previous_cursor,
                    outcome.cursor
                );
            }
            Err(e) => {
                error!(loader = %def.name, kind = e.kind(), error = %e, "Loader failed");
                println!("{} {}: {}", "✗".red(), def.name, e);
                failed.push(def.name.as_str());
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} loader(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgstage_core::Entity;

    fn definitions() -> Vec<LoaderDefinition> {
        vec![
            LoaderDefinition::builder("couriers", Entity::Couriers)
                .build()
                .unwrap(),
            LoaderDefinition::builder("orders", Entity::Orders)
                .build()
                .unwrap(),
        ]
    }

    #[test]
    fn test_select_all_when_no_names() {
        let defs = definitions();
        let selected = select(&defs, &[]).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_select_keeps_given_order() {
        let defs = definitions();
        let names = vec!["orders".to_string(), "couriers".to_string()];
        let selected = select(&defs, &names).unwrap();
        assert_eq!(selected[0].name, "orders");
        assert_eq!(selected[1].name, "couriers");
    }

    #[test]
    fn test_select_unknown_name_fails() {
        let defs = definitions();
        let err = select(&defs, &["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Unknown loader 'nope'"));
    }
}
