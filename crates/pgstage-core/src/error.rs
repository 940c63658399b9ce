use thiserror::Error;

/// Errors that abort a loader run.
///
/// Every variant rolls the run's transaction back. An empty batch is not an
/// error; it is reported through [`crate::RunOutcome`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("write failed: {0}")]
    WriteFailure(String),

    #[error("checkpoint access failed: {0}")]
    CheckpointAccess(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("invalid loader configuration: {0}")]
    InvalidConfig(String),
}

impl LoadError {
    pub fn source(message: impl Into<String>) -> Self {
        LoadError::SourceUnavailable(message.into())
    }

    pub fn write(message: impl Into<String>) -> Self {
        LoadError::WriteFailure(message.into())
    }

    pub fn checkpoint(message: impl Into<String>) -> Self {
        LoadError::CheckpointAccess(message.into())
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        LoadError::Transaction(message.into())
    }

    /// Stable name of the error kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::SourceUnavailable(_) => "source_unavailable",
            LoadError::WriteFailure(_) => "write_failure",
            LoadError::CheckpointAccess(_) => "checkpoint_access",
            LoadError::Transaction(_) => "transaction",
            LoadError::InvalidConfig(_) => "invalid_config",
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
