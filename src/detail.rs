//! On-demand coin detail view
//!
//! Loaded when a coin is opened, dropped when it is closed. Detail and price
//! history are fetched concurrently; the chart is derived from the history.

use crate::{
    chart::PriceChart,
    constants::DEFAULT_HISTORY_DAYS,
    error::FetchError,
    provider::MarketDataProvider,
    types::{CoinDetail, PriceHistory},
};
use futures::future::try_join;

/// Everything the detail view renders
#[derive(Debug, Clone, PartialEq)]
pub struct CoinDetailView {
    pub detail: CoinDetail,
    pub history: PriceHistory,
    pub chart: PriceChart,
}

impl CoinDetailView {
    /// Fetches detail and history for `id` over the last `days` days
    ///
    /// Fails with the generic error of whichever request failed first.
    pub async fn load(
        provider: &dyn MarketDataProvider,
        id: &str,
        days: u32,
    ) -> Result<Self, FetchError> {
        let (detail, history) = try_join(
            provider.fetch_coin_detail(id),
            provider.fetch_price_history(id, days),
        )
        .await
        .map_err(|e| {
            tracing::warn!(coin_id = %id, days, error = %e, "Failed to load coin detail view");
            e
        })?;

        let chart = PriceChart::from_history(&history);
        tracing::debug!(
            coin_id = %id,
            points = chart.points.len(),
            trend = ?chart.summary.trend,
            "Loaded coin detail view"
        );

        Ok(Self {
            detail,
            history,
            chart,
        })
    }

    /// Same as [`load`](Self::load) with the default 7 day window
    pub async fn load_default(
        provider: &dyn MarketDataProvider,
        id: &str,
    ) -> Result<Self, FetchError> {
        Self::load(provider, id, DEFAULT_HISTORY_DAYS).await
    }

    /// Price in `currency` from the detail block
    pub fn current_price(&self, currency: &str) -> Option<f64> {
        self.detail.market_data.price_in(currency)
    }
}
