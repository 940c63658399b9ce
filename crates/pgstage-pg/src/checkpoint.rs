//! Checkpoints stored in a settings table of the sink database.

use pgstage_core::{CheckpointStore, LoadError, LoadResult, Settings, WorkflowSetting};
use tokio_postgres::{Client, Row};
use tracing::{debug, info};

use crate::error::{describe, PgResult};
use crate::warehouse::PgTransaction;

pub const DEFAULT_SCHEMA: &str = "stg";
pub const DEFAULT_TABLE: &str = "srv_wf_settings";

/// Checkpoint store over `{schema}.{table}`.
#[derive(Debug, Clone)]
pub struct PgCheckpointStore {
    relation: String,
}

impl Default for PgCheckpointStore {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA, DEFAULT_TABLE)
    }
}

impl PgCheckpointStore {
    /// Both parts must be plain identifiers; they are interpolated into SQL.
    pub fn new(schema: &str, table: &str) -> Self {
        Self {
            relation: format!("{}.{}", schema, table),
        }
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Create the schema and settings table if missing.
    pub async fn ensure_schema(&self, client: &Client) -> PgResult<()> {
        debug!(relation = %self.relation, "Ensuring checkpoint table exists");

        let schema = self
            .relation
            .split('.')
            .next()
            .unwrap_or(DEFAULT_SCHEMA);
        client
            .batch_execute(&format!(
                r#"
                CREATE SCHEMA IF NOT EXISTS {schema};
                CREATE TABLE IF NOT EXISTS {relation} (
                    id SERIAL PRIMARY KEY,
                    workflow_key VARCHAR NOT NULL UNIQUE,
                    workflow_settings JSON NOT NULL
                );
                "#,
                schema = schema,
                relation = self.relation
            ))
            .await?;

        info!(relation = %self.relation, "Checkpoint table ready");
        Ok(())
    }

    /// All stored checkpoints, ordered by key.
    pub async fn list(&self, tx: &mut PgTransaction) -> LoadResult<Vec<WorkflowSetting>> {
        let rows = tx
            .client()
            .query(
                &format!(
                    "SELECT id::bigint, workflow_key, workflow_settings::text FROM {} ORDER BY workflow_key",
                    self.relation
                ),
                &[],
            )
            .await
            .map_err(|e| LoadError::checkpoint(describe(&e)))?;

        rows.iter().map(setting_from_row).collect()
    }
}

fn setting_from_row(row: &Row) -> LoadResult<WorkflowSetting> {
    let id: i64 = row
        .try_get(0)
        .map_err(|e| LoadError::checkpoint(describe(&e)))?;
    let workflow_key: String = row
        .try_get(1)
        .map_err(|e| LoadError::checkpoint(describe(&e)))?;
    let text: String = row
        .try_get(2)
        .map_err(|e| LoadError::checkpoint(describe(&e)))?;

    Ok(WorkflowSetting {
        id,
        settings: parse_settings(&workflow_key, &text)?,
        workflow_key,
    })
}

/// Parse the stored JSON text. Anything but a JSON object is corrupt.
pub(crate) fn parse_settings(workflow_key: &str, text: &str) -> LoadResult<Settings> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(settings)) => Ok(settings),
        Ok(other) => Err(LoadError::checkpoint(format!(
            "settings for '{}' are not a JSON object: {}",
            workflow_key, other
        ))),
        Err(e) => Err(LoadError::checkpoint(format!(
            "settings for '{}' are not valid JSON: {}",
            workflow_key, e
        ))),
    }
}

impl CheckpointStore<PgTransaction> for PgCheckpointStore {
    async fn get(
        &self,
        tx: &mut PgTransaction,
        workflow_key: &str,
    ) -> LoadResult<Option<WorkflowSetting>> {
        let row = tx
            .client()
            .query_opt(
                &format!(
                    "SELECT id::bigint, workflow_key, workflow_settings::text FROM {} WHERE workflow_key = $1",
                    self.relation
                ),
                &[&workflow_key],
            )
            .await
            .map_err(|e| LoadError::checkpoint(describe(&e)))?;

        row.as_ref().map(setting_from_row).transpose()
    }

    async fn save(
        &self,
        tx: &mut PgTransaction,
        workflow_key: &str,
        settings: &Settings,
    ) -> LoadResult<()> {
        let text = serde_json::to_string(settings)
            .map_err(|e| LoadError::checkpoint(e.to_string()))?;

        tx.client()
            .execute(
                &format!(
                    r#"
                    INSERT INTO {} (workflow_key, workflow_settings)
                    VALUES ($1, $2::text::json)
                    ON CONFLICT (workflow_key) DO UPDATE
                    SET workflow_settings = EXCLUDED.workflow_settings
                    "#,
                    self.relation
                ),
                &[&workflow_key, &text],
            )
            .await
            .map_err(|e| LoadError::checkpoint(describe(&e)))?;

        debug!(workflow = %workflow_key, settings = %text, "Saved checkpoint");
        Ok(())
    }
}
