mod error;
mod loader;
mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{LoaderConfig, LoadersConfig};
pub use validation::{
    is_qualified_identifier, to_definition, to_definitions, validate_loader, validate_loaders,
    MAX_BATCH_LIMIT,
};
