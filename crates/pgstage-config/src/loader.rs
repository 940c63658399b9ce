use serde::Deserialize;

use crate::error::ConfigResult;

/// One `[[loaders]]` entry as parsed from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Name used on the command line, e.g. `pgstage run couriers`.
    pub name: String,
    /// Which shipped loader to run: couriers, deliveries, orders,
    /// product_sales or courier_ledgers.
    pub entity: String,
    /// Checkpoint key. Defaults to the entity's key.
    pub workflow_key: Option<String>,
    /// Records per run. Defaults to the entity's limit.
    pub batch_limit: Option<i64>,
    /// Destination relation as `schema.table`.
    pub table: Option<String>,
    /// Sort field sent to the delivery API.
    pub sort_field: Option<String>,
}

/// A file holding only loader entries.
#[derive(Debug, Default, Deserialize)]
pub struct LoadersConfig {
    #[serde(default)]
    pub loaders: Vec<LoaderConfig>,
}

impl LoadersConfig {
    /// Parse loader entries from a TOML string.
    pub fn parse(toml_str: &str) -> ConfigResult<Self> {
        let config: LoadersConfig = toml::from_str(toml_str)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_loader() {
        let toml = r#"
[[loaders]]
name = "couriers"
entity = "couriers"
"#;
        let config = LoadersConfig::parse(toml).unwrap();
        assert_eq!(config.loaders.len(), 1);
        assert_eq!(config.loaders[0].name, "couriers");
        assert!(config.loaders[0].workflow_key.is_none());
        assert!(config.loaders[0].batch_limit.is_none());
    }

    #[test]
    fn test_parse_full_loader() {
        let toml = r#"
[[loaders]]
name = "deliveries"
entity = "deliveries"
workflow_key = "deliveries_v2"
batch_limit = 50
table = "stg.deliveries_v2"
sort_field = "date"
"#;
        let config = LoadersConfig::parse(toml).unwrap();
        let loader = &config.loaders[0];
        assert_eq!(loader.workflow_key.as_deref(), Some("deliveries_v2"));
        assert_eq!(loader.batch_limit, Some(50));
        assert_eq!(loader.table.as_deref(), Some("stg.deliveries_v2"));
        assert_eq!(loader.sort_field.as_deref(), Some("date"));
    }

    #[test]
    fn test_parse_empty_file() {
        let config = LoadersConfig::parse("").unwrap();
        assert!(config.loaders.is_empty());
    }

    #[test]
    fn test_parse_missing_entity_fails() {
        let toml = r#"
[[loaders]]
name = "couriers"
"#;
        assert!(LoadersConfig::parse(toml).is_err());
    }
}
