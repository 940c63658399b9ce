//! Destination entities and their typed payloads.

use serde::{Deserialize, Serialize};

use crate::types::{RowMap, ToRow, Value};

/// The loaders shipped with pgstage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    /// Raw courier objects from the delivery API into staging.
    Couriers,
    /// Raw delivery objects from the delivery API into staging.
    Deliveries,
    /// Order dimension built from staging orders and deliveries.
    Orders,
    /// Product sales fact built from bonus transactions.
    ProductSales,
    /// Monthly courier ledger aggregated from orders and sales.
    CourierLedgers,
}

impl Entity {
    pub const ALL: [Entity; 5] = [
        Entity::Couriers,
        Entity::Deliveries,
        Entity::Orders,
        Entity::ProductSales,
        Entity::CourierLedgers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Entity::Couriers => "couriers",
            Entity::Deliveries => "deliveries",
            Entity::Orders => "orders",
            Entity::ProductSales => "product_sales",
            Entity::CourierLedgers => "courier_ledgers",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Entity::ALL.into_iter().find(|e| e.as_str() == s)
    }

    pub fn default_workflow_key(self) -> &'static str {
        match self {
            Entity::Couriers => "example_couriers_origin_to_stg_workflow",
            Entity::Deliveries => "example_deliveries_origin_to_stg_workflow",
            Entity::Orders => "orders_origin_to_dds_workflow",
            Entity::ProductSales => "sales_origin_to_dds_workflow",
            Entity::CourierLedgers => "courier_ledgers_dds_to_cdm_workflow",
        }
    }

    pub fn default_batch_limit(self) -> usize {
        match self {
            Entity::Deliveries => 10,
            _ => 1,
        }
    }

    /// Schema-qualified destination relation.
    pub fn default_table(self) -> &'static str {
        match self {
            Entity::Couriers => "stg.deliverysystem_couriers",
            Entity::Deliveries => "stg.deliverysystem_deliveries",
            Entity::Orders => "dds.dm_orders",
            Entity::ProductSales => "dds.fct_product_sales",
            Entity::CourierLedgers => "cdm.dm_courier_ledger",
        }
    }

    /// REST resource for entities read from the delivery API.
    pub fn api_resource(self) -> Option<&'static str> {
        match self {
            Entity::Couriers => Some("couriers"),
            Entity::Deliveries => Some("deliveries"),
            _ => None,
        }
    }

    pub fn is_api_backed(self) -> bool {
        self.api_resource().is_some()
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque upstream object stored verbatim as JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObject {
    pub object_value: String,
}

impl RawObject {
    pub fn from_json(value: &serde_json::Value) -> Self {
        Self {
            object_value: value.to_string(),
        }
    }
}

impl ToRow for RawObject {
    fn to_row(&self) -> RowMap {
        [("object_value".to_string(), Value::from(self.object_value.as_str()))]
            .into_iter()
            .collect()
    }
}

/// A row of `dds.dm_orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    pub order_key: String,
    pub order_status: String,
    pub restaurant_id: i64,
    pub user_id: i64,
    pub timestamp_id: i64,
    pub courier_id: i64,
}

impl ToRow for OrderRow {
    fn to_row(&self) -> RowMap {
        [
            ("order_key", Value::from(self.order_key.as_str())),
            ("order_status", Value::from(self.order_status.as_str())),
            ("restaurant_id", Value::from(self.restaurant_id)),
            ("user_id", Value::from(self.user_id)),
            ("timestamp_id", Value::from(self.timestamp_id)),
            ("courier_id", Value::from(self.courier_id)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// A row of `dds.fct_product_sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSaleRow {
    pub product_id: i64,
    pub order_id: i64,
    pub count: i64,
    pub price: f64,
    pub total_sum: f64,
    pub bonus_payment: f64,
    pub bonus_grant: f64,
    pub tip_sum: f64,
}

impl ToRow for ProductSaleRow {
    fn to_row(&self) -> RowMap {
        [
            ("product_id", Value::from(self.product_id)),
            ("order_id", Value::from(self.order_id)),
            ("count", Value::from(self.count)),
            ("price", Value::from(self.price)),
            ("total_sum", Value::from(self.total_sum)),
            ("bonus_payment", Value::from(self.bonus_payment)),
            ("bonus_grant", Value::from(self.bonus_grant)),
            ("tip_sum", Value::from(self.tip_sum)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// A row of `cdm.dm_courier_ledger`, keyed by courier and settlement month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierLedgerRow {
    pub courier_id: i64,
    pub courier_name: String,
    pub settlement_year: i32,
    pub settlement_month: i32,
    pub orders_count: i64,
    pub total_sum: f64,
    pub rate_avg: f64,
    pub order_processing_fee: f64,
    pub courier_order_sum: f64,
    pub courier_tips_sum: f64,
    pub courier_reward_sum: f64,
}

impl CourierLedgerRow {
    /// Columns of the business key.
    pub const KEY_COLUMNS: [&'static str; 3] =
        ["courier_id", "settlement_year", "settlement_month"];
}

impl ToRow for CourierLedgerRow {
    fn to_row(&self) -> RowMap {
        [
            ("courier_id", Value::from(self.courier_id)),
            ("courier_name", Value::from(self.courier_name.as_str())),
            ("settlement_year", Value::from(self.settlement_year)),
            ("settlement_month", Value::from(self.settlement_month)),
            ("orders_count", Value::from(self.orders_count)),
            ("total_sum", Value::from(self.total_sum)),
            ("rate_avg", Value::from(self.rate_avg)),
            ("order_processing_fee", Value::from(self.order_processing_fee)),
            ("courier_order_sum", Value::from(self.courier_order_sum)),
            ("courier_tips_sum", Value::from(self.courier_tips_sum)),
            ("courier_reward_sum", Value::from(self.courier_reward_sum)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_parse_roundtrips_names() {
        for entity in Entity::ALL {
            assert_eq!(Entity::parse(entity.as_str()), Some(entity));
        }
        assert_eq!(Entity::parse("restaurants"), None);
    }

    #[test]
    fn test_api_backed_entities() {
        assert_eq!(Entity::Couriers.api_resource(), Some("couriers"));
        assert_eq!(Entity::Deliveries.api_resource(), Some("deliveries"));
        assert!(!Entity::Orders.is_api_backed());
    }

    #[test]
    fn test_raw_object_keeps_json_text() {
        let raw = RawObject::from_json(&serde_json::json!({"_id": "c1", "name": "Ann"}));
        let row = raw.to_row();
        let text = row.get("object_value").and_then(Value::as_str).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["_id"], "c1");
    }

    #[test]
    fn test_ledger_row_has_key_columns() {
        let row = CourierLedgerRow {
            courier_id: 7,
            courier_name: "Ann".into(),
            settlement_year: 2024,
            settlement_month: 3,
            orders_count: 2,
            total_sum: 100.0,
            rate_avg: 4.2,
            order_processing_fee: 25.0,
            courier_order_sum: 150.0,
            courier_tips_sum: 10.0,
            courier_reward_sum: 159.5,
        }
        .to_row();

        for column in CourierLedgerRow::KEY_COLUMNS {
            assert!(row.contains_key(column), "missing {column}");
        }
        assert_eq!(row.len(), 11);
    }
}
