use crate::entity::Entity;
use crate::error::{LoadError, LoadResult};

/// A configured loader: which entity it moves, under which checkpoint key,
/// and how many records a single run may carry.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderDefinition {
    /// Name used on the command line.
    pub name: String,
    pub entity: Entity,
    /// Unique checkpoint key.
    pub workflow_key: String,
    /// Maximum records fetched and written per run.
    pub batch_limit: usize,
    /// Schema-qualified destination relation.
    pub table: String,
    /// Field the API is asked to sort by (API-backed entities only).
    pub sort_field: String,
}

impl LoaderDefinition {
    /// Start a definition with the entity's defaults.
    pub fn builder(name: impl Into<String>, entity: Entity) -> LoaderDefinitionBuilder {
        LoaderDefinitionBuilder {
            name: name.into(),
            entity,
            workflow_key: None,
            batch_limit: None,
            table: None,
            sort_field: None,
        }
    }
}

/// Builder for [`LoaderDefinition`].
#[derive(Debug)]
pub struct LoaderDefinitionBuilder {
    name: String,
    entity: Entity,
    workflow_key: Option<String>,
    batch_limit: Option<usize>,
    table: Option<String>,
    sort_field: Option<String>,
}

impl LoaderDefinitionBuilder {
    pub fn workflow_key(mut self, key: impl Into<String>) -> Self {
        self.workflow_key = Some(key.into());
        self
    }

    pub fn batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = Some(limit);
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn sort_field(mut self, field: impl Into<String>) -> Self {
        self.sort_field = Some(field.into());
        self
    }

    pub fn build(self) -> LoadResult<LoaderDefinition> {
        if self.name.trim().is_empty() {
            return Err(LoadError::InvalidConfig("loader name is empty".into()));
        }

        let workflow_key = self
            .workflow_key
            .unwrap_or_else(|| self.entity.default_workflow_key().to_string());
        if workflow_key.trim().is_empty() {
            return Err(LoadError::InvalidConfig(format!(
                "loader '{}' has an empty workflow key",
                self.name
            )));
        }

        let batch_limit = self
            .batch_limit
            .unwrap_or_else(|| self.entity.default_batch_limit());
        if batch_limit == 0 {
            return Err(LoadError::InvalidConfig(format!(
                "loader '{}' has a batch limit of 0",
                self.name
            )));
        }

        Ok(LoaderDefinition {
            table: self
                .table
                .unwrap_or_else(|| self.entity.default_table().to_string()),
            sort_field: self.sort_field.unwrap_or_else(|| "id".to_string()),
            name: self.name,
            entity: self.entity,
            workflow_key,
            batch_limit,
        })
    }
}
