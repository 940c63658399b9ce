mod error;
mod reader;

pub use error::{ApiError, ApiResult};
pub use reader::{records_from_page, ApiConfig, PagedApiReader, DEFAULT_TIMEOUT_SECS};
