use pgstage_core::{LoadError, LoadResult, Transaction, Warehouse};
use tokio_postgres::Client;
use tracing::debug;

use crate::connect::connect_postgres;
use crate::error::describe;

/// The sink database.
///
/// Every transaction gets its own connection, so the transaction handle owns
/// its client and can be moved through a run without borrowing the warehouse.
#[derive(Debug, Clone)]
pub struct PgWarehouse {
    connection_string: String,
}

impl PgWarehouse {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

impl Warehouse for PgWarehouse {
    type Tx = PgTransaction;

    async fn begin(&self) -> LoadResult<PgTransaction> {
        let client = connect_postgres(&self.connection_string)
            .await
            .map_err(|e| LoadError::transaction(e.to_string()))?;
        client
            .batch_execute("BEGIN")
            .await
            .map_err(|e| LoadError::transaction(format!("BEGIN failed: {}", describe(&e))))?;
        debug!("Transaction started");
        Ok(PgTransaction { client })
    }
}

/// An open transaction on a dedicated connection.
///
/// Dropping it without commit or rollback closes the connection, which aborts
/// the transaction on the server.
pub struct PgTransaction {
    client: Client,
}

impl PgTransaction {
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Transaction for PgTransaction {
    async fn commit(self) -> LoadResult<()> {
        self.client
            .batch_execute("COMMIT")
            .await
            .map_err(|e| LoadError::transaction(format!("COMMIT failed: {}", describe(&e))))
    }

    async fn rollback(self) -> LoadResult<()> {
        self.client
            .batch_execute("ROLLBACK")
            .await
            .map_err(|e| LoadError::transaction(format!("ROLLBACK failed: {}", describe(&e))))
    }
}
