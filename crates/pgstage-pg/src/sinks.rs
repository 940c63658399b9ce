//! Sink writers into the warehouse.
//!
//! Destination relations are interpolated into the statements and must be
//! plain `schema.table` identifiers; values are always bound as parameters.

use pgstage_core::{
    CourierLedgerRow, LoadError, LoadResult, OrderRow, ProductSaleRow, RawObject, SinkWriter,
    SourceRecord,
};

use crate::error::describe;
use crate::warehouse::PgTransaction;

fn write_err(table: &str, sequence_key: i64, e: &tokio_postgres::Error) -> LoadError {
    LoadError::write(format!(
        "{} (record {}): {}",
        table,
        sequence_key,
        describe(e)
    ))
}

/// Appends raw objects into a staging table with an `object_value` column.
#[derive(Debug, Clone)]
pub struct StagingSink {
    table: String,
}

impl StagingSink {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    fn statement(&self) -> String {
        format!("INSERT INTO {} (object_value) VALUES ($1::text)", self.table)
    }
}

impl SinkWriter<PgTransaction, RawObject> for StagingSink {
    async fn write(&self, tx: &mut PgTransaction, record: &SourceRecord<RawObject>) -> LoadResult<()> {
        tx.client()
            .execute(&self.statement(), &[&record.payload.object_value])
            .await
            .map_err(|e| write_err(&self.table, record.sequence_key, &e))?;
        Ok(())
    }
}

/// Appends order dimension rows.
#[derive(Debug, Clone)]
pub struct OrderSink {
    table: String,
}

impl OrderSink {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    fn statement(&self) -> String {
        format!(
            "INSERT INTO {} (order_key, order_status, restaurant_id, user_id, timestamp_id, courier_id) \
             VALUES ($1::text, $2::text, $3::bigint, $4::bigint, $5::bigint, $6::bigint)",
            self.table
        )
    }
}

impl SinkWriter<PgTransaction, OrderRow> for OrderSink {
    async fn write(&self, tx: &mut PgTransaction, record: &SourceRecord<OrderRow>) -> LoadResult<()> {
        let o = &record.payload;
        tx.client()
            .execute(
                &self.statement(),
                &[
                    &o.order_key,
                    &o.order_status,
                    &o.restaurant_id,
                    &o.user_id,
                    &o.timestamp_id,
                    &o.courier_id,
                ],
            )
            .await
            .map_err(|e| write_err(&self.table, record.sequence_key, &e))?;
        Ok(())
    }
}

/// Appends product sale facts.
#[derive(Debug, Clone)]
pub struct ProductSaleSink {
    table: String,
}

impl ProductSaleSink {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    fn statement(&self) -> String {
        format!(
            "INSERT INTO {} (product_id, order_id, count, price, total_sum, bonus_payment, bonus_grant, tip_sum) \
             VALUES ($1::bigint, $2::bigint, $3::bigint, $4::float8, $5::float8, $6::float8, $7::float8, $8::float8)",
            self.table
        )
    }
}

impl SinkWriter<PgTransaction, ProductSaleRow> for ProductSaleSink {
    async fn write(
        &self,
        tx: &mut PgTransaction,
        record: &SourceRecord<ProductSaleRow>,
    ) -> LoadResult<()> {
        let s = &record.payload;
        tx.client()
            .execute(
                &self.statement(),
                &[
                    &s.product_id,
                    &s.order_id,
                    &s.count,
                    &s.price,
                    &s.total_sum,
                    &s.bonus_payment,
                    &s.bonus_grant,
                    &s.tip_sum,
                ],
            )
            .await
            .map_err(|e| write_err(&self.table, record.sequence_key, &e))?;
        Ok(())
    }
}

/// Upserts monthly ledger rows on `(courier_id, settlement_year, settlement_month)`.
///
/// A conflicting row is overwritten with the freshly settled values; the
/// reader always emits complete month totals, so nothing is merged here.
#[derive(Debug, Clone)]
pub struct CourierLedgerSink {
    table: String,
}

impl CourierLedgerSink {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    fn statement(&self) -> String {
        format!(
            r#"
            INSERT INTO {} (
                courier_id, courier_name, settlement_year, settlement_month,
                orders_count, orders_total_sum, rate_avg, order_processing_fee,
                courier_order_sum, courier_tips_sum, courier_reward_sum
            )
            VALUES (
                $1::bigint, $2::text, $3::int, $4::int,
                $5::bigint, $6::float8, $7::float8, $8::float8,
                $9::float8, $10::float8, $11::float8
            )
            ON CONFLICT ({}) DO UPDATE SET
                courier_name = EXCLUDED.courier_name,
                orders_count = EXCLUDED.orders_count,
                orders_total_sum = EXCLUDED.orders_total_sum,
                rate_avg = EXCLUDED.rate_avg,
                order_processing_fee = EXCLUDED.order_processing_fee,
                courier_order_sum = EXCLUDED.courier_order_sum,
                courier_tips_sum = EXCLUDED.courier_tips_sum,
                courier_reward_sum = EXCLUDED.courier_reward_sum
            "#,
            self.table,
            CourierLedgerRow::KEY_COLUMNS.join(", ")
        )
    }
}

impl SinkWriter<PgTransaction, CourierLedgerRow> for CourierLedgerSink {
    async fn write(
        &self,
        tx: &mut PgTransaction,
        record: &SourceRecord<CourierLedgerRow>,
    ) -> LoadResult<()> {
        let l = &record.payload;
        tx.client()
            .execute(
                &self.statement(),
                &[
                    &l.courier_id,
                    &l.courier_name,
                    &l.settlement_year,
                    &l.settlement_month,
                    &l.orders_count,
                    &l.total_sum,
                    &l.rate_avg,
                    &l.order_processing_fee,
                    &l.courier_order_sum,
                    &l.courier_tips_sum,
                    &l.courier_reward_sum,
                ],
            )
            .await
            .map_err(|e| write_err(&self.table, record.sequence_key, &e))?;
        Ok(())
    }
}
