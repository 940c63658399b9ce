use pgstage_core::LoadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PgError {
    #[error("postgres error: {0}")]
    Postgres(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("column '{column}': {message}")]
    Decode { column: String, message: String },
}

/// Render a driver error, with severity and SQLSTATE when the server sent one.
pub fn describe(e: &tokio_postgres::Error) -> String {
    match e.as_db_error() {
        Some(db_err) => format!(
            "{}: {} (code: {})",
            db_err.severity(),
            db_err.message(),
            db_err.code().code()
        ),
        None => e.to_string(),
    }
}

impl From<tokio_postgres::Error> for PgError {
    fn from(e: tokio_postgres::Error) -> Self {
        PgError::Postgres(describe(&e))
    }
}

impl From<PgError> for LoadError {
    /// Connection and schema failures surface as transaction errors.
    fn from(e: PgError) -> Self {
        LoadError::transaction(e.to_string())
    }
}

pub type PgResult<T> = Result<T, PgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = PgError::Decode {
            column: "courier_id".into(),
            message: "expected an integer".into(),
        };
        assert_eq!(err.to_string(), "column 'courier_id': expected an integer");
    }

    #[test]
    fn test_pg_error_converts_to_transaction_kind() {
        let err: LoadError = PgError::Connection("refused".into()).into();
        assert_eq!(err.kind(), "transaction");
    }
}
