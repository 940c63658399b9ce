use std::future::Future;

use crate::error::LoadResult;

/// An open transaction on the sink database.
///
/// Finishing consumes the handle, so a transaction is committed or rolled back
/// exactly once. Implementations must also roll back when dropped unfinished.
pub trait Transaction: Send {
    fn commit(self) -> impl Future<Output = LoadResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = LoadResult<()>> + Send;
}

/// A sink database that can begin transactions.
pub trait Warehouse: Send + Sync {
    type Tx: Transaction;

    fn begin(&self) -> impl Future<Output = LoadResult<Self::Tx>> + Send;
}
