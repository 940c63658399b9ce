use std::future::Future;

use crate::error::LoadResult;
use crate::record::SourceRecord;

/// Writes records into a destination relation inside the caller's transaction.
///
/// A sink never opens or commits a transaction. Upsert sinks only overwrite;
/// any aggregation happens in the source reader before records get here.
pub trait SinkWriter<Tx, R>: Send + Sync {
    /// Persist one record. Failures map to [`crate::LoadError::WriteFailure`].
    fn write(
        &self,
        tx: &mut Tx,
        record: &SourceRecord<R>,
    ) -> impl Future<Output = LoadResult<()>> + Send;
}
