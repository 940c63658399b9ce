use pgstage_core::LoadError;
use thiserror::Error;

/// Errors from the delivery-system API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("client setup failed: {0}")]
    Client(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<ApiError> for LoadError {
    fn from(e: ApiError) -> Self {
        LoadError::source(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
