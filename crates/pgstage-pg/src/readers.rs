//! Source readers over the upstream database.
//!
//! Each query binds `$1` (exclusive lower bound on the sequence key) and `$2`
//! (row limit) and returns rows ascending by `sequence_key`.

use std::marker::PhantomData;

use pgstage_core::{
    Batch, CourierLedgerRow, CourierMonth, LoadError, LoadResult, OrderRow, ProductSaleRow,
    RowMap, SourceReader, SourceRecord,
};
use tokio_postgres::Client;
use tracing::debug;

use crate::connect::connect_postgres;
use crate::decode::{get_f64, get_i64, get_string, row_to_map};
use crate::error::{describe, PgResult};

/// A paged query and the decoding of its rows.
pub trait SourceQuery: Send + Sync + 'static {
    type Record: Send + Sync;

    /// Short name for logs.
    const NAME: &'static str;

    /// SQL with `$1` threshold and `$2` limit placeholders.
    const SQL: &'static str;

    fn decode(row: &RowMap) -> PgResult<Self::Record>;
}

/// A [`SourceReader`] running a [`SourceQuery`] on its own connection.
pub struct PgSource<Q> {
    client: Client,
    _query: PhantomData<fn() -> Q>,
}

impl<Q: SourceQuery> PgSource<Q> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _query: PhantomData,
        }
    }

    pub async fn connect(connection_string: &str) -> PgResult<Self> {
        Ok(Self::new(connect_postgres(connection_string).await?))
    }
}

impl<Q: SourceQuery> SourceReader for PgSource<Q> {
    type Record = Q::Record;

    async fn fetch(&self, threshold: i64, limit: usize) -> LoadResult<Batch<Q::Record>> {
        let limit = i64::try_from(limit)
            .map_err(|_| LoadError::source(format!("limit {} out of range", limit)))?;

        let rows = self
            .client
            .query(Q::SQL, &[&threshold, &limit])
            .await
            .map_err(|e| LoadError::source(format!("{} query failed: {}", Q::NAME, describe(&e))))?;

        let records = rows
            .iter()
            .map(|row| {
                let map = row_to_map(row)?;
                let sequence_key = get_i64(&map, "sequence_key")?;
                Ok(SourceRecord::new(sequence_key, Q::decode(&map)?))
            })
            .collect::<PgResult<Vec<_>>>()
            .map_err(|e| LoadError::source(format!("{} row decode failed: {}", Q::NAME, e)))?;

        debug!(source = Q::NAME, threshold, fetched = records.len(), "Fetched rows");
        Ok(Batch::new(records))
    }
}

/// Orders from staging, resolved against the dds dimensions.
///
/// Keyed by the staging order row id. An order resolves once its delivery is
/// staged and its restaurant, user, timestamp and courier are in dds. Rows
/// are only returned below the first order that does not resolve yet, so the
/// cursor waits for the dimension loaders instead of skipping it.
pub struct OrdersQuery;

impl SourceQuery for OrdersQuery {
    type Record = OrderRow;

    const NAME: &'static str = "orders";

    const SQL: &'static str = r#"
        WITH pending AS (
            SELECT soo.id, soo.object_id, soo.object_value::json AS obj
            FROM stg.ordersystem_orders soo
            WHERE soo.id > $1::bigint
        ),
        resolved AS (
            SELECT DISTINCT ON (p.id)
                p.id::bigint AS sequence_key,
                p.object_id::varchar AS order_key,
                (p.obj ->> 'final_status')::varchar AS order_status,
                dr.id::bigint AS restaurant_id,
                du.id::bigint AS user_id,
                dt.id::bigint AS timestamp_id,
                dc.id::bigint AS courier_id
            FROM pending p
            JOIN stg.deliverysystem_deliveries sdd
                ON (sdd.object_value::json ->> 'order_id') = p.object_id
            JOIN dds.dm_restaurants dr
                ON dr.restaurant_id = (p.obj -> 'restaurant' ->> 'id')
            JOIN dds.dm_users du
                ON du.user_id = (p.obj -> 'user' ->> 'id')
            JOIN dds.dm_timestamps dt
                ON dt.ts = (p.obj ->> 'date')::timestamp
            JOIN dds.dm_couriers dc
                ON dc.courier_id = (sdd.object_value::json ->> 'courier_id')
            ORDER BY p.id, sdd.id DESC
        ),
        blocked AS (
            SELECT MIN(p.id)::bigint AS first_id
            FROM pending p
            WHERE NOT EXISTS (SELECT 1 FROM resolved r WHERE r.sequence_key = p.id)
        )
        SELECT r.*
        FROM resolved r
        CROSS JOIN blocked b
        WHERE b.first_id IS NULL OR r.sequence_key < b.first_id
        ORDER BY r.sequence_key ASC
        LIMIT $2::bigint
    "#;

    fn decode(row: &RowMap) -> PgResult<OrderRow> {
        Ok(OrderRow {
            order_key: get_string(row, "order_key")?,
            order_status: get_string(row, "order_status")?,
            restaurant_id: get_i64(row, "restaurant_id")?,
            user_id: get_i64(row, "user_id")?,
            timestamp_id: get_i64(row, "timestamp_id")?,
            courier_id: get_i64(row, "courier_id")?,
        })
    }
}

/// Product lines of bonus transactions.
///
/// Each event expands to one row per product payment, keyed by
/// `event_id * 1000 + position` so lines of one event stay adjacent and a
/// batch limit can split an event without losing lines. The order's tip is
/// carried on its first line only so that summing lines counts it once.
///
/// An event whose order or products are not in dds yet holds back itself and
/// every later event until the orders loader catches up.
pub struct ProductSalesQuery;

impl SourceQuery for ProductSalesQuery {
    type Record = ProductSaleRow;

    const NAME: &'static str = "product_sales";

    const SQL: &'static str = r#"
        WITH lines AS (
            SELECT
                be.id::bigint AS event_id,
                pp.position::bigint AS position,
                pp.payment,
                (be.event_value::json ->> 'order_id') AS order_key
            FROM stg.bonussystem_events be
            CROSS JOIN LATERAL json_array_elements(be.event_value::json -> 'product_payments')
                WITH ORDINALITY AS pp(payment, position)
            WHERE be.event_type = 'bonus_transaction'
                AND be.id::bigint * 1000 + pp.position > $1::bigint
        ),
        resolved AS (
            SELECT DISTINCT ON (l.event_id, l.position)
                (l.event_id * 1000 + l.position)::bigint AS sequence_key,
                l.event_id,
                dp.id::bigint AS product_id,
                dor.id::bigint AS order_id,
                (l.payment ->> 'quantity')::bigint AS count,
                (l.payment ->> 'price')::float8 AS price,
                (l.payment ->> 'product_cost')::float8 AS total_sum,
                (l.payment ->> 'bonus_payment')::float8 AS bonus_payment,
                (l.payment ->> 'bonus_grant')::float8 AS bonus_grant,
                CASE WHEN l.position = 1
                    THEN COALESCE((sdd.object_value::json ->> 'tip_sum')::float8, 0)
                    ELSE 0
                END::float8 AS tip_sum
            FROM lines l
            JOIN dds.dm_orders dor
                ON dor.order_key = l.order_key
            JOIN dds.dm_products dp
                ON dp.product_id = (l.payment ->> 'product_id')
            LEFT JOIN stg.deliverysystem_deliveries sdd
                ON (sdd.object_value::json ->> 'order_id') = dor.order_key
            ORDER BY l.event_id, l.position, dp.id DESC, sdd.id DESC
        ),
        blocked AS (
            SELECT MIN(l.event_id) AS first_event
            FROM lines l
            WHERE NOT EXISTS (
                SELECT 1 FROM resolved r
                WHERE r.sequence_key = l.event_id * 1000 + l.position
            )
        )
        SELECT r.*
        FROM resolved r
        CROSS JOIN blocked b
        WHERE b.first_event IS NULL OR r.event_id < b.first_event
        ORDER BY r.sequence_key ASC
        LIMIT $2::bigint
    "#;

    fn decode(row: &RowMap) -> PgResult<ProductSaleRow> {
        Ok(ProductSaleRow {
            product_id: get_i64(row, "product_id")?,
            order_id: get_i64(row, "order_id")?,
            count: get_i64(row, "count")?,
            price: get_f64(row, "price")?,
            total_sum: get_f64(row, "total_sum")?,
            bonus_payment: get_f64(row, "bonus_payment")?,
            bonus_grant: get_f64(row, "bonus_grant")?,
            tip_sum: get_f64(row, "tip_sum")?,
        })
    }
}

/// Monthly courier totals, settled into ledger rows.
///
/// One row per courier and settlement month, keyed by the newest product sale
/// id in the group. Sales are append-only, so any new line for one of the
/// month's orders, or a new order, raises the key and the month is re-emitted
/// with its full totals.
pub struct CourierLedgersQuery;

impl SourceQuery for CourierLedgersQuery {
    type Record = CourierLedgerRow;

    const NAME: &'static str = "courier_ledgers";

    const SQL: &'static str = r#"
        WITH order_totals AS (
            SELECT
                dor.id AS order_id,
                dor.order_key,
                dor.courier_id,
                dt.year AS settlement_year,
                dt.month AS settlement_month,
                SUM(fps.total_sum) AS total_sum,
                SUM(fps.tip_sum) AS tips_sum,
                MAX(fps.id) AS last_sale_id
            FROM dds.dm_orders dor
            JOIN dds.dm_timestamps dt ON dt.id = dor.timestamp_id
            JOIN dds.fct_product_sales fps ON fps.order_id = dor.id
            GROUP BY dor.id, dor.order_key, dor.courier_id, dt.year, dt.month
        ),
        order_rates AS (
            SELECT DISTINCT ON (sdd.object_value::json ->> 'order_id')
                (sdd.object_value::json ->> 'order_id') AS order_key,
                (sdd.object_value::json ->> 'rate')::float8 AS rate
            FROM stg.deliverysystem_deliveries sdd
            ORDER BY (sdd.object_value::json ->> 'order_id'), sdd.id DESC
        )
        SELECT
            MAX(ot.last_sale_id)::bigint AS sequence_key,
            dc.id::bigint AS courier_id,
            dc.courier_name::varchar AS courier_name,
            ot.settlement_year::int AS settlement_year,
            ot.settlement_month::int AS settlement_month,
            COUNT(DISTINCT ot.order_id)::bigint AS orders_count,
            COALESCE(SUM(ot.total_sum), 0)::float8 AS total_sum,
            COALESCE(AVG(r.rate), 0)::float8 AS rate_avg,
            COALESCE(SUM(ot.tips_sum), 0)::float8 AS tips_sum
        FROM order_totals ot
        JOIN dds.dm_couriers dc ON dc.id = ot.courier_id
        LEFT JOIN order_rates r ON r.order_key = ot.order_key
        GROUP BY dc.id, dc.courier_name, ot.settlement_year, ot.settlement_month
        HAVING MAX(ot.last_sale_id) > $1::bigint
        ORDER BY sequence_key ASC
        LIMIT $2::bigint
    "#;

    fn decode(row: &RowMap) -> PgResult<CourierLedgerRow> {
        Ok(courier_month(row)?.settle())
    }
}

fn courier_month(row: &RowMap) -> PgResult<CourierMonth> {
    Ok(CourierMonth {
        courier_id: get_i64(row, "courier_id")?,
        courier_name: get_string(row, "courier_name")?,
        settlement_year: get_i64(row, "settlement_year")? as i32,
        settlement_month: get_i64(row, "settlement_month")? as i32,
        orders_count: get_i64(row, "orders_count")?,
        total_sum: get_f64(row, "total_sum")?,
        rate_avg: get_f64(row, "rate_avg")?,
        tips_sum: get_f64(row, "tips_sum")?,
    })
}

pub type OrdersSource = PgSource<OrdersQuery>;
pub type ProductSalesSource = PgSource<ProductSalesQuery>;
pub type CourierLedgersSource = PgSource<CourierLedgersQuery>;
