//! Construction of the `params` object for each remote method.
//!
//! Every operation shares one generic transport call, but the shape of its
//! parameters differs. [`OperationParams`] is the closed set of extra
//! parameter bags; [`build_params`] turns a filter plus at most one bag into
//! the wire object, leaving out every field that holds a zero value. The
//! remote service treats an absent field differently from an empty one, so
//! omission is the contract, not `null`.

use crate::dto::{
    MarketFilter, MarketProjection, MatchProjection, OrderProjection, PlaceInstruction,
    PriceProjection, TimeGranularity, TimeRange,
};
use serde::Serialize;

pub const LOCALE: &str = "en";

/// List-style parameters. Any subset may be set; zero values are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketFilterParams {
    pub granularity: Option<TimeGranularity>,
    pub max_results: Option<i32>,
    pub market_id: Option<String>,
    pub market_ids: Vec<String>,
    pub selection_id: Option<i64>,
    pub market_projection: Vec<MarketProjection>,
    pub price_projection: Option<PriceProjection>,
    pub order_projection: Option<OrderProjection>,
    pub match_projection: Option<MatchProjection>,
    pub date_range: Option<TimeRange>,
}

impl MarketFilterParams {
    pub fn time_ranges(granularity: TimeGranularity) -> Self {
        Self {
            granularity: Some(granularity),
            ..Default::default()
        }
    }

    pub fn market_catalogue(max_results: i32, market_projection: Vec<MarketProjection>) -> Self {
        Self {
            max_results: Some(max_results),
            market_projection,
            ..Default::default()
        }
    }

    pub fn market_book(
        market_ids: Vec<String>,
        price_projection: Option<PriceProjection>,
        order_projection: Option<OrderProjection>,
        match_projection: Option<MatchProjection>,
    ) -> Self {
        Self {
            market_ids,
            price_projection,
            order_projection,
            match_projection,
            ..Default::default()
        }
    }

    pub fn runner_book(
        market_id: impl Into<String>,
        selection_id: i64,
        price_projection: Option<PriceProjection>,
        order_projection: Option<OrderProjection>,
        match_projection: Option<MatchProjection>,
    ) -> Self {
        Self {
            market_id: Some(market_id.into()),
            selection_id: Some(selection_id),
            price_projection,
            order_projection,
            match_projection,
            ..Default::default()
        }
    }

    pub fn current_orders(date_range: Option<TimeRange>) -> Self {
        Self {
            date_range,
            ..Default::default()
        }
    }
}

/// Parameters for `placeOrders`. A filter is never sent with these.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceInstructionParams {
    pub market_id: String,
    pub customer_ref: Option<String>,
    pub customer_strategy_ref: Option<String>,
    pub instructions: Vec<PlaceInstruction>,
}

/// The extra parameter bag supplied alongside the filter.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationParams {
    Market(MarketFilterParams),
    PlaceOrders(PlaceInstructionParams),
}

impl From<MarketFilterParams> for OperationParams {
    fn from(params: MarketFilterParams) -> Self {
        OperationParams::Market(params)
    }
}

impl From<PlaceInstructionParams> for OperationParams {
    fn from(params: PlaceInstructionParams) -> Self {
        OperationParams::PlaceOrders(params)
    }
}

/// Wire-level `params` object. Borrows from the caller's filter and bag.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Params<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<&'a MarketFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<TimeGranularity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_ids: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_projection: Option<&'a PriceProjection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_projection: Option<OrderProjection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_projection: Option<MatchProjection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_projection: Option<&'a [MarketProjection]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<&'a TimeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_ref: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_strategy_ref: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<&'a [PlaceInstruction]>,
    pub locale: &'static str,
}

/// Build the `params` object for one call.
///
/// With no bag the result is exactly `{filter, locale}`.
pub fn build_params<'a>(
    filter: Option<&'a MarketFilter>,
    extra: Option<&'a OperationParams>,
) -> Params<'a> {
    match extra {
        None => Params {
            filter,
            locale: LOCALE,
            ..Default::default()
        },
        Some(OperationParams::Market(bag)) => market_params(filter, bag),
        Some(OperationParams::PlaceOrders(bag)) => place_params(bag),
    }
}

fn market_params<'a>(filter: Option<&'a MarketFilter>, bag: &'a MarketFilterParams) -> Params<'a> {
    Params {
        filter,
        granularity: bag.granularity,
        max_results: bag.max_results.filter(|n| *n != 0),
        market_id: non_empty_str(&bag.market_id),
        market_ids: non_empty_slice(&bag.market_ids),
        selection_id: bag.selection_id.filter(|id| *id != 0),
        price_projection: bag
            .price_projection
            .as_ref()
            .filter(|p| **p != PriceProjection::default()),
        order_projection: bag.order_projection,
        match_projection: bag.match_projection,
        market_projection: non_empty_slice(&bag.market_projection),
        date_range: bag.date_range.as_ref().filter(|r| !r.is_empty()),
        locale: LOCALE,
        ..Default::default()
    }
}

fn place_params(bag: &PlaceInstructionParams) -> Params<'_> {
    Params {
        market_id: Some(bag.market_id.as_str()).filter(|id| !id.is_empty()),
        customer_ref: non_empty_str(&bag.customer_ref),
        customer_strategy_ref: non_empty_str(&bag.customer_strategy_ref),
        instructions: non_empty_slice(&bag.instructions),
        locale: LOCALE,
        ..Default::default()
    }
}

fn non_empty_str(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn non_empty_slice<T>(value: &[T]) -> Option<&[T]> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{PriceData, Side};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::{json, to_value};

    #[test]
    fn test_filter_only() {
        let filter = MarketFilter {
            event_ids: Some(vec!["1".to_string()]),
            ..Default::default()
        };

        let params = build_params(Some(&filter), None);

        assert_eq!(
            params,
            Params {
                filter: Some(&filter),
                locale: "en",
                ..Default::default()
            }
        );
        assert_eq!(
            to_value(&params).unwrap(),
            json!({"filter": {"eventIds": ["1"]}, "locale": "en"})
        );
    }

    #[test]
    fn test_market_parameters_supplied_with_days_granularity() {
        let bag = OperationParams::Market(MarketFilterParams {
            granularity: Some(TimeGranularity::Days),
            max_results: Some(1),
            market_ids: vec!["123".to_string(), "456".to_string(), "678".to_string()],
            market_projection: vec![MarketProjection::Event],
            price_projection: Some(PriceProjection::new(vec![PriceData::ExBestOffers])),
            order_projection: Some(OrderProjection::Executable),
            match_projection: Some(MatchProjection::RolledUpByAvgPrice),
            ..Default::default()
        });

        let value = to_value(build_params(None, Some(&bag))).unwrap();

        // the exchange spells the daily bucket DAYS, never DAY
        assert_eq!(value["granularity"], json!("DAYS"));
        assert_eq!(
            value,
            json!({
                "granularity": "DAYS",
                "maxResults": 1,
                "marketIds": ["123", "456", "678"],
                "marketProjection": ["EVENT"],
                "priceProjection": {"priceData": ["EX_BEST_OFFERS"]},
                "orderProjection": "EXECUTABLE",
                "matchProjection": "ROLLED_UP_BY_AVG_PRICE",
                "locale": "en"
            })
        );
        assert!(value.get("filter").is_none());
    }

    #[test]
    fn test_zero_values_are_omitted() {
        let bag = OperationParams::Market(MarketFilterParams {
            max_results: Some(0),
            market_id: Some(String::new()),
            selection_id: Some(0),
            price_projection: Some(PriceProjection::default()),
            date_range: Some(TimeRange::default()),
            ..Default::default()
        });

        let value = to_value(build_params(None, Some(&bag))).unwrap();

        assert_eq!(value, json!({"locale": "en"}));
    }

    #[test]
    fn test_zero_valued_filter_fields_are_omitted() {
        let filter = MarketFilter {
            event_type_ids: Some(vec![]),
            bsp_only: Some(false),
            turn_in_play_enabled: Some(false),
            text_query: Some(String::new()),
            ..Default::default()
        };

        let value = to_value(build_params(Some(&filter), None)).unwrap();

        assert_eq!(value, json!({"filter": {}, "locale": "en"}));
    }

    #[test]
    fn test_runner_book_shape() {
        let bag: OperationParams = MarketFilterParams::runner_book(
            "1.234",
            47972,
            None,
            Some(OrderProjection::All),
            None,
        )
        .into();

        let value = to_value(build_params(None, Some(&bag))).unwrap();

        assert_eq!(
            value,
            json!({
                "marketId": "1.234",
                "selectionId": 47972,
                "orderProjection": "ALL",
                "locale": "en"
            })
        );
    }

    #[test]
    fn test_filter_kept_alongside_list_bag() {
        let filter = MarketFilter {
            market_type_codes: Some(vec!["MATCH_ODDS".to_string()]),
            ..Default::default()
        };
        let bag: OperationParams =
            MarketFilterParams::market_catalogue(1, vec![MarketProjection::RunnerMetadata]).into();

        let value = to_value(build_params(Some(&filter), Some(&bag))).unwrap();

        assert_eq!(value["filter"], json!({"marketTypeCodes": ["MATCH_ODDS"]}));
        assert_eq!(value["maxResults"], json!(1));
        assert_eq!(value["marketProjection"], json!(["RUNNER_METADATA"]));
    }

    #[test]
    fn test_current_orders_date_range() {
        let range = TimeRange {
            from: Some("2024-01-01T00:00:00Z".to_string()),
            to: None,
        };
        let bag: OperationParams = MarketFilterParams::current_orders(Some(range)).into();

        let value = to_value(build_params(None, Some(&bag))).unwrap();

        assert_eq!(
            value,
            json!({"dateRange": {"from": "2024-01-01T00:00:00Z"}, "locale": "en"})
        );
    }

    #[test]
    fn test_place_orders_never_carries_filter() {
        let filter = MarketFilter {
            event_type_ids: Some(vec!["1".to_string()]),
            ..Default::default()
        };
        let bag: OperationParams = PlaceInstructionParams {
            market_id: "1.109850906".to_string(),
            customer_ref: Some("ref-1".to_string()),
            customer_strategy_ref: Some(String::new()),
            instructions: vec![PlaceInstruction::limit(237486, Side::Lay, dec!(3.0), dec!(2))],
        }
        .into();

        let value = to_value(build_params(Some(&filter), Some(&bag))).unwrap();

        assert!(value.get("filter").is_none());
        assert!(value.get("customerStrategyRef").is_none());
        assert_eq!(value["marketId"], json!("1.109850906"));
        assert_eq!(value["customerRef"], json!("ref-1"));
        assert_eq!(value["instructions"][0]["selectionId"], json!(237486));
        assert_eq!(value["instructions"][0]["side"], json!("LAY"));
        assert_eq!(value["locale"], json!("en"));
    }

    #[test]
    fn test_empty_place_bag() {
        let bag = OperationParams::PlaceOrders(PlaceInstructionParams::default());

        let value = to_value(build_params(None, Some(&bag))).unwrap();

        assert_eq!(value, json!({"locale": "en"}));
    }
}
