use super::common::{
    MarketBettingType, MarketStatus, OrderStatus, PriceData, PriceSize, RunnerStatus, TimeRange,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sparse selection criteria shared by the list operations.
///
/// Unset fields are left off the wire entirely, and so are empty lists, blank
/// text, `false` flags and a time range with neither bound.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketFilter {
    #[serde(default, skip_serializing_if = "is_none_or_blank")]
    pub text_query: Option<String>,
    #[serde(default, skip_serializing_if = "is_none_or_empty")]
    pub event_type_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "is_none_or_empty")]
    pub event_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "is_none_or_empty")]
    pub competition_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "is_none_or_empty")]
    pub market_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "is_none_or_empty")]
    pub venues: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "is_none_or_false")]
    pub bsp_only: Option<bool>,
    #[serde(default, skip_serializing_if = "is_none_or_false")]
    pub turn_in_play_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "is_none_or_false")]
    pub in_play_only: Option<bool>,
    #[serde(default, skip_serializing_if = "is_none_or_empty")]
    pub market_betting_types: Option<Vec<MarketBettingType>>,
    #[serde(default, skip_serializing_if = "is_none_or_empty")]
    pub market_countries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "is_none_or_empty")]
    pub market_type_codes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "is_none_or_unbounded")]
    pub market_start_time: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "is_none_or_empty")]
    pub with_orders: Option<Vec<OrderStatus>>,
    #[serde(default, skip_serializing_if = "is_none_or_empty")]
    pub race_types: Option<Vec<String>>,
}

fn is_none_or_empty<T>(value: &Option<Vec<T>>) -> bool {
    value.as_ref().map_or(true, Vec::is_empty)
}

fn is_none_or_false(value: &Option<bool>) -> bool {
    !value.unwrap_or(false)
}

fn is_none_or_blank(value: &Option<String>) -> bool {
    value.as_ref().map_or(true, String::is_empty)
}

fn is_none_or_unbounded(value: &Option<TimeRange>) -> bool {
    value.as_ref().map_or(true, TimeRange::is_empty)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceProjection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub price_data: Vec<PriceData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtualise: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollover_stakes: Option<bool>,
}

impl PriceProjection {
    pub fn new(price_data: Vec<PriceData>) -> Self {
        Self {
            price_data,
            ..Default::default()
        }
    }
}

// Navigation results (listEventTypes, listCompetitions, ...)

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeResult {
    pub event_type: EventType,
    pub market_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionResult {
    pub competition: Competition,
    pub market_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition_region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangeResult {
    pub time_range: TimeRange,
    pub market_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventResult {
    pub event: Event,
    pub market_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketTypeResult {
    pub market_type: String,
    pub market_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountryCodeResult {
    pub country_code: String,
    pub market_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VenueResult {
    pub venue: String,
    pub market_count: i32,
}

// Catalogue

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketCatalogue {
    pub market_id: String,
    pub market_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_matched: Option<f64>,
    #[serde(default)]
    pub runners: Vec<RunnerCatalog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition: Option<Competition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

impl MarketCatalogue {
    pub fn runner_name(&self, selection_id: i64) -> Option<&str> {
        self.runners
            .iter()
            .find(|r| r.selection_id == selection_id)
            .map(|r| r.runner_name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerCatalog {
    pub selection_id: i64,
    pub runner_name: String,
    #[serde(default)]
    pub handicap: f64,
    #[serde(default)]
    pub sort_priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Option<String>>>,
}

// Books

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketBook {
    pub market_id: String,
    #[serde(default)]
    pub is_market_data_delayed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MarketStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_delay: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bsp_reconciled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inplay: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_winners: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_runners: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_match_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_matched: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_available: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_matching: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runners_voidable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(default)]
    pub runners: Vec<Runner>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runner {
    pub selection_id: i64,
    #[serde(default)]
    pub handicap: f64,
    pub status: RunnerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_price_traded: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_matched: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ex: Option<ExchangePrices>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangePrices {
    #[serde(default)]
    pub available_to_back: Vec<PriceSize>,
    #[serde(default)]
    pub available_to_lay: Vec<PriceSize>,
    #[serde(default)]
    pub traded_volume: Vec<PriceSize>,
}
