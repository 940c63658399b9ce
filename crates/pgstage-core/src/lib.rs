pub mod checkpoint;
pub mod definition;
pub mod entity;
pub mod error;
pub mod ledger;
pub mod loader;
pub mod memory;
pub mod record;
pub mod sink;
pub mod source;
pub mod transaction;
pub mod types;

pub use checkpoint::{
    CheckpointStore, Settings, WorkflowSetting, COLD_START_CURSOR, LAST_LOADED_ID_KEY,
};
pub use definition::{LoaderDefinition, LoaderDefinitionBuilder};
pub use entity::{CourierLedgerRow, Entity, OrderRow, ProductSaleRow, RawObject};
pub use error::{LoadError, LoadResult};
pub use ledger::{CommissionTier, CourierMonth};
pub use loader::{Loader, RunOutcome};
pub use memory::{
    MemoryCheckpointStore, MemoryInsertSink, MemoryState, MemoryTransaction, MemoryUpsertSink,
    MemoryWarehouse, VecSource,
};
pub use record::{Batch, SourceRecord};
pub use sink::SinkWriter;
pub use source::SourceReader;
pub use transaction::{Transaction, Warehouse};
pub use types::{RowMap, ToRow, Value};
