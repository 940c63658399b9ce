use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use pgstage_api::{ApiConfig, DEFAULT_TIMEOUT_SECS};
use pgstage_config::{is_qualified_identifier, LoaderConfig};
use pgstage_core::LoaderDefinition;
use pgstage_pg::{PgCheckpointStore, DEFAULT_SCHEMA, DEFAULT_TABLE};

/// Project configuration from pgstage.toml
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    pub warehouse: DatabaseConfig,
    /// Upstream database for the warehouse-query loaders. Defaults to the warehouse.
    pub origin: Option<DatabaseConfig>,
    pub api: Option<ApiSection>,
    #[serde(default)]
    pub checkpoints: CheckpointsConfig,
    #[serde(default)]
    pub loaders: Vec<LoaderConfig>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub connection_string: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiSection {
    pub base_url: String,
    pub api_key: String,
    pub nickname: String,
    pub cohort: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CheckpointsConfig {
    #[serde(default = "default_checkpoint_schema")]
    pub schema: String,
    #[serde(default = "default_checkpoint_table")]
    pub table: String,
}

impl Default for CheckpointsConfig {
    fn default() -> Self {
        Self {
            schema: default_checkpoint_schema(),
            table: default_checkpoint_table(),
        }
    }
}

fn default_checkpoint_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_checkpoint_table() -> String {
    DEFAULT_TABLE.to_string()
}

/// Resolve environment variables in a string.
/// Supports ${VAR_NAME} syntax; an unset variable is an error.
pub fn resolve_env(s: &str) -> Result<String> {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            bail!("Unterminated ${{...}} in '{}'", s);
        };
        let var_name = &rest[start + 2..start + len];
        let value = std::env::var(var_name)
            .with_context(|| format!("Environment variable {} is not set", var_name))?;
        result.push_str(&rest[..start]);
        result.push_str(&value);
        rest = &rest[start + len + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(content).context("Failed to parse TOML")?;
        pgstage_config::validate_loaders(&config.loaders, config.api.is_some())?;
        let relation = format!("{}.{}", config.checkpoints.schema, config.checkpoints.table);
        if !is_qualified_identifier(&relation) {
            bail!("Invalid checkpoint table '{}'", relation);
        }
        Ok(config)
    }

    /// Get the resolved warehouse connection string.
    pub fn warehouse_connection_string(&self) -> Result<String> {
        resolve_env(&self.warehouse.connection_string)
    }

    /// Get the resolved origin connection string, falling back to the warehouse.
    pub fn origin_connection_string(&self) -> Result<String> {
        match &self.origin {
            Some(origin) => resolve_env(&origin.connection_string),
            None => self.warehouse_connection_string(),
        }
    }

    /// Get the resolved API settings, if an [api] section exists.
    pub fn api_config(&self) -> Result<Option<ApiConfig>> {
        let Some(api) = &self.api else {
            return Ok(None);
        };
        Ok(Some(ApiConfig {
            base_url: resolve_env(&api.base_url)?,
            api_key: resolve_env(&api.api_key)?,
            nickname: resolve_env(&api.nickname)?,
            cohort: resolve_env(&api.cohort)?,
            timeout_secs: api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        }))
    }

    pub fn checkpoint_store(&self) -> PgCheckpointStore {
        PgCheckpointStore::new(&self.checkpoints.schema, &self.checkpoints.table)
    }

    /// All configured loaders, in file order.
    pub fn definitions(&self) -> Result<Vec<LoaderDefinition>> {
        Ok(pgstage_config::to_definitions(
            &self.loaders,
            self.api.is_some(),
        )?)
    }
}
