use std::future::Future;

use crate::error::LoadResult;
use crate::record::Batch;

/// Read-only access to an upstream source.
pub trait SourceReader: Send + Sync {
    /// Payload type carried by each fetched record.
    type Record: Send + Sync;

    /// Fetch records whose `sequence_key` is strictly greater than `threshold`,
    /// ascending by key, at most `limit` of them.
    ///
    /// Transport or query failures map to [`crate::LoadError::SourceUnavailable`].
    fn fetch(
        &self,
        threshold: i64,
        limit: usize,
    ) -> impl Future<Output = LoadResult<Batch<Self::Record>>> + Send;
}
