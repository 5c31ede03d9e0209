use super::common::{
    OrderStatus, OrderType, PersistenceType, PriceSize, Side, TimeInForce,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceInstruction {
    pub order_type: OrderType,
    pub selection_id: i64,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(with = "super::decimal_serde::option")]
    pub handicap: Option<Decimal>,
    pub side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_order: Option<LimitOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_order_ref: Option<String>,
}

impl PlaceInstruction {
    /// A plain limit order that lapses when the market turns in-play.
    pub fn limit(selection_id: i64, side: Side, price: Decimal, size: Decimal) -> Self {
        Self {
            order_type: OrderType::Limit,
            selection_id,
            handicap: Some(Decimal::ZERO),
            side,
            limit_order: Some(LimitOrder {
                size,
                price,
                persistence_type: PersistenceType::Lapse,
                time_in_force: None,
                min_fill_size: None,
            }),
            customer_order_ref: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrder {
    #[serde(with = "super::decimal_serde")]
    pub size: Decimal,
    #[serde(with = "super::decimal_serde")]
    pub price: Decimal,
    pub persistence_type: PersistenceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<TimeInForce>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(with = "super::decimal_serde::option")]
    pub min_fill_size: Option<Decimal>,
}

/// Result of `placeOrders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceExecutionReport {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default)]
    pub market_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_ref: Option<String>,
    #[serde(default)]
    pub instruction_reports: Vec<PlaceInstructionReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceInstructionReport {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_status: Option<OrderStatus>,
    pub instruction: PlaceInstruction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placed_date: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(with = "super::decimal_serde::option")]
    pub average_price_matched: Option<Decimal>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(with = "super::decimal_serde::option")]
    pub size_matched: Option<Decimal>,
}

/// Result of `listCurrentOrders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentOrderSummaryReport {
    #[serde(default)]
    pub current_orders: Vec<CurrentOrderSummary>,
    #[serde(default)]
    pub more_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentOrderSummary {
    pub bet_id: String,
    pub market_id: String,
    pub selection_id: i64,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(with = "super::decimal_serde::option")]
    pub handicap: Option<Decimal>,
    pub price_size: PriceSize,
    pub side: Side,
    pub status: OrderStatus,
    pub persistence_type: PersistenceType,
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placed_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_date: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(with = "super::decimal_serde::option")]
    pub average_price_matched: Option<Decimal>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(with = "super::decimal_serde::option")]
    pub size_matched: Option<Decimal>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(with = "super::decimal_serde::option")]
    pub size_remaining: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_order_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_strategy_ref: Option<String>,
}
