//! Typed betting operations.
//!
//! [`BettingApi`] maps each remote operation onto one [`JsonRpcClient::invoke`]
//! call and decodes the result into its typed form.
//!
//! Result decoding is best-effort: a `result` the typed form cannot represent
//! yields the empty value (empty list, default report) and a `warn!` naming the
//! operation. Transport, status and remote errors are always returned.

use crate::dto::{
    CompetitionResult, CountryCodeResult, CurrentOrderSummaryReport, EventResult,
    EventTypeResult, MarketBook, MarketCatalogue, MarketFilter, MarketProjection,
    MarketTypeResult, MatchProjection, OrderProjection, PlaceExecutionReport, PriceProjection,
    TimeGranularity, TimeRange, TimeRangeResult, VenueResult,
};
use crate::error::Result;
use crate::params::{MarketFilterParams, OperationParams, PlaceInstructionParams};
use crate::transport::{JsonRpcClient, Session};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::warn;

/// Envelope id sent with every call.
const REQUEST_ID: i32 = 1;

#[derive(Clone)]
pub struct BettingApi {
    client: Arc<JsonRpcClient>,
}

impl BettingApi {
    pub fn new(client: JsonRpcClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Facade over a client already shared with other facades; they all see
    /// the same session token.
    pub fn from_shared(client: Arc<JsonRpcClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<JsonRpcClient> {
        &self.client
    }

    pub async fn authenticate(&self) -> Result<Session> {
        self.client.authenticate().await
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub async fn list_event_types(&self, filter: &MarketFilter) -> Result<Vec<EventTypeResult>> {
        self.call("listEventTypes", Some(filter), None).await
    }

    pub async fn list_competitions(
        &self,
        filter: &MarketFilter,
    ) -> Result<Vec<CompetitionResult>> {
        self.call("listCompetitions", Some(filter), None).await
    }

    /// Market counts bucketed by `granularity`.
    ///
    /// `from` and `to` become the filter's market start time window; when both
    /// are `None` the filter is sent unchanged.
    pub async fn list_time_ranges(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        filter: &MarketFilter,
        granularity: TimeGranularity,
    ) -> Result<Vec<TimeRangeResult>> {
        let window = TimeRange {
            from: from.map(format_timestamp),
            to: to.map(format_timestamp),
        };
        let mut filter = filter.clone();
        if !window.is_empty() {
            filter.market_start_time = Some(window);
        }

        let params: OperationParams = MarketFilterParams::time_ranges(granularity).into();
        self.call("listTimeRanges", Some(&filter), Some(&params))
            .await
    }

    pub async fn list_events(&self, filter: &MarketFilter) -> Result<Vec<EventResult>> {
        self.call("listEvents", Some(filter), None).await
    }

    pub async fn list_market_types(&self, filter: &MarketFilter) -> Result<Vec<MarketTypeResult>> {
        self.call("listMarketTypes", Some(filter), None).await
    }

    pub async fn list_countries(&self, filter: &MarketFilter) -> Result<Vec<CountryCodeResult>> {
        self.call("listCountries", Some(filter), None).await
    }

    pub async fn list_venues(&self, filter: &MarketFilter) -> Result<Vec<VenueResult>> {
        self.call("listVenues", Some(filter), None).await
    }

    // ========================================================================
    // Markets
    // ========================================================================

    pub async fn list_market_catalogue(
        &self,
        filter: &MarketFilter,
        max_results: i32,
        market_projection: Vec<MarketProjection>,
    ) -> Result<Vec<MarketCatalogue>> {
        let params: OperationParams =
            MarketFilterParams::market_catalogue(max_results, market_projection).into();
        self.call("listMarketCatalogue", Some(filter), Some(&params))
            .await
    }

    /// Books for the given market ids. Sent without a filter.
    pub async fn list_market_book(
        &self,
        market_ids: Vec<String>,
        price_projection: Option<PriceProjection>,
        order_projection: Option<OrderProjection>,
        match_projection: Option<MatchProjection>,
    ) -> Result<Vec<MarketBook>> {
        let params: OperationParams = MarketFilterParams::market_book(
            market_ids,
            price_projection,
            order_projection,
            match_projection,
        )
        .into();
        self.call("listMarketBook", None, Some(&params)).await
    }

    /// Book for a single runner. Sent without a filter.
    pub async fn list_runner_book(
        &self,
        market_id: &str,
        selection_id: i64,
        price_projection: Option<PriceProjection>,
        order_projection: Option<OrderProjection>,
        match_projection: Option<MatchProjection>,
    ) -> Result<Vec<MarketBook>> {
        let params: OperationParams = MarketFilterParams::runner_book(
            market_id,
            selection_id,
            price_projection,
            order_projection,
            match_projection,
        )
        .into();
        self.call("listRunnerBook", None, Some(&params)).await
    }

    // ========================================================================
    // Orders
    // ========================================================================

    pub async fn list_current_orders(
        &self,
        date_range: Option<TimeRange>,
    ) -> Result<CurrentOrderSummaryReport> {
        let params: OperationParams = MarketFilterParams::current_orders(date_range).into();
        self.call("listCurrentOrders", None, Some(&params)).await
    }

    pub async fn place_orders(&self, params: PlaceInstructionParams) -> Result<PlaceExecutionReport> {
        let params = OperationParams::PlaceOrders(params);
        self.call("placeOrders", None, Some(&params)).await
    }

    async fn call<T>(
        &self,
        operation: &str,
        filter: Option<&MarketFilter>,
        params: Option<&OperationParams>,
    ) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let raw = self
            .client
            .invoke(REQUEST_ID, operation, filter, params)
            .await?;
        Ok(decode_lenient(operation, &raw))
    }
}

fn decode_lenient<T>(operation: &str, raw: &[u8]) -> T
where
    T: DeserializeOwned + Default,
{
    serde_json::from_slice(raw).unwrap_or_else(|e| {
        warn!("Discarding undecodable {} result: {}", operation, e);
        T::default()
    })
}

/// Wire date-time: RFC 3339 in UTC with second precision, e.g. `2024-05-01T12:00:00Z`.
fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
