//! Provider abstraction over the upstream market-data API

use crate::{
    error::FetchError,
    types::{Coin, CoinDetail, PriceHistory, SearchResults},
};
use async_trait::async_trait;

/// Trait for market data providers
///
/// Every method is a fresh round trip; implementations do not cache. Errors
/// are already collapsed to the generic per-endpoint [`FetchError`].
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches one page of the market snapshot, ordered by market cap
    ///
    /// # Arguments
    /// * `currency` - Quote currency code, e.g. `"usd"`
    /// * `page` - 1-based page number
    /// * `per_page` - Page size
    async fn fetch_market_snapshot(
        &self,
        currency: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Coin>, FetchError>;

    /// Fetches market entries restricted to the given identifiers
    async fn fetch_markets_by_ids(
        &self,
        currency: &str,
        ids: &[&str],
    ) -> Result<Vec<Coin>, FetchError>;

    /// Free-text search over coins
    async fn search(&self, query: &str) -> Result<SearchResults, FetchError>;

    /// Fetches the full detail record of one coin
    async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, FetchError>;

    /// Fetches the price history of one coin over the last `days` days
    async fn fetch_price_history(&self, id: &str, days: u32) -> Result<PriceHistory, FetchError>;

    /// Quote currency used when the caller has no preference
    fn default_currency(&self) -> &str;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}
