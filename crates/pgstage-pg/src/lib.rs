mod checkpoint;
mod connect;
mod decode;
mod error;
mod readers;
mod sinks;
mod warehouse;

pub use checkpoint::{PgCheckpointStore, DEFAULT_SCHEMA, DEFAULT_TABLE};
pub use connect::connect_postgres;
pub use decode::{row_to_map, row_to_value};
pub use error::{describe, PgError, PgResult};
pub use readers::{
    CourierLedgersQuery, CourierLedgersSource, OrdersQuery, OrdersSource, PgSource,
    ProductSalesQuery, ProductSalesSource, SourceQuery,
};
pub use sinks::{CourierLedgerSink, OrderSink, ProductSaleSink, StagingSink};
pub use warehouse::{PgTransaction, PgWarehouse};
