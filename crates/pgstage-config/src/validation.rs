use std::collections::{HashMap, HashSet};

use pgstage_core::{Entity, LoaderDefinition};

use crate::error::{ConfigError, ConfigResult};
use crate::loader::LoaderConfig;

/// Upper bound for `batch_limit`.
pub const MAX_BATCH_LIMIT: i64 = 10_000;

/// Validate a single loader entry and resolve its entity.
pub fn validate_loader(config: &LoaderConfig) -> ConfigResult<Entity> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::MissingField {
            field: "name".into(),
        });
    }

    let entity = Entity::parse(&config.entity).ok_or_else(|| ConfigError::UnknownEntity {
        value: config.entity.clone(),
    })?;

    if let Some(key) = &config.workflow_key {
        if key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: format!("loaders.{}.workflow_key", config.name),
            });
        }
    }

    if let Some(limit) = config.batch_limit {
        if !(1..=MAX_BATCH_LIMIT).contains(&limit) {
            return Err(ConfigError::InvalidBatchLimit {
                loader: config.name.clone(),
                value: limit,
                max: MAX_BATCH_LIMIT,
            });
        }
    }

    if let Some(table) = &config.table {
        if !is_qualified_identifier(table) {
            return Err(ConfigError::InvalidTable(table.clone()));
        }
    }

    if let Some(field) = &config.sort_field {
        if field.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: format!("loaders.{}.sort_field", config.name),
            });
        }
    }

    Ok(entity)
}

/// Validate a set of loaders together.
///
/// Names and workflow keys must be unique across the set, and API-backed
/// loaders need an `[api]` section.
pub fn validate_loaders(configs: &[LoaderConfig], api_configured: bool) -> ConfigResult<()> {
    let mut names: HashSet<&str> = HashSet::new();
    let mut keys: HashMap<String, &str> = HashMap::new();

    for config in configs {
        let entity = validate_loader(config)?;

        if !names.insert(config.name.as_str()) {
            return Err(ConfigError::DuplicateName(config.name.clone()));
        }

        let key = config
            .workflow_key
            .clone()
            .unwrap_or_else(|| entity.default_workflow_key().to_string());
        if let Some(first) = keys.insert(key.clone(), config.name.as_str()) {
            return Err(ConfigError::DuplicateWorkflowKey {
                key,
                first: first.to_string(),
                second: config.name.clone(),
            });
        }

        if entity.is_api_backed() && !api_configured {
            return Err(ConfigError::MissingApi(config.name.clone()));
        }
    }

    Ok(())
}

/// Whether `s` is a `schema.table` pair of plain SQL identifiers.
///
/// Table names are interpolated into statements, so nothing that would need
/// quoting is accepted.
pub fn is_qualified_identifier(s: &str) -> bool {
    let mut parts = s.split('.');
    let (Some(schema), Some(table), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    is_identifier(schema) && is_identifier(table)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Convert a validated loader entry to a core definition.
pub fn to_definition(config: &LoaderConfig) -> ConfigResult<LoaderDefinition> {
    let entity = validate_loader(config)?;

    let mut builder = LoaderDefinition::builder(&config.name, entity);
    if let Some(key) = &config.workflow_key {
        builder = builder.workflow_key(key);
    }
    if let Some(limit) = config.batch_limit {
        // Range checked by validate_loader.
        builder = builder.batch_limit(limit as usize);
    }
    if let Some(table) = &config.table {
        builder = builder.table(table);
    }
    if let Some(field) = &config.sort_field {
        builder = builder.sort_field(field);
    }

    Ok(builder.build()?)
}

/// Validate a set of loaders and convert them all.
pub fn to_definitions(
    configs: &[LoaderConfig],
    api_configured: bool,
) -> ConfigResult<Vec<LoaderDefinition>> {
    validate_loaders(configs, api_configured)?;
    configs.iter().map(to_definition).collect()
}
