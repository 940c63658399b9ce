use pgstage_core::LoadError;
use thiserror::Error;

/// Errors that can occur when parsing or validating loader configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("unknown entity '{value}': expected one of couriers, deliveries, orders, product_sales, courier_ledgers")]
    UnknownEntity { value: String },

    #[error("loader '{loader}': batch_limit must be between 1 and {max}, got {value}")]
    InvalidBatchLimit {
        loader: String,
        value: i64,
        max: i64,
    },

    #[error("duplicate loader name '{0}'")]
    DuplicateName(String),

    #[error("workflow key '{key}' is used by both '{first}' and '{second}'")]
    DuplicateWorkflowKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("loader '{0}' reads from the delivery API but no [api] section is configured")]
    MissingApi(String),

    #[error("invalid table name '{0}': expected schema.table")]
    InvalidTable(String),

    #[error(transparent)]
    Definition(#[from] LoadError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
