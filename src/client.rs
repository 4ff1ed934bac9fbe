//! CoinGecko market data client
//!
//! Wraps every upstream call in the retry loop and collapses failures to the
//! generic per-endpoint [`FetchError`]. Upstream detail is logged, not returned.

use crate::{
    config::DashboardConfig,
    constants::{
        COINGECKO_COINS_ENDPOINT, COINGECKO_MARKETS_ENDPOINT, COINGECKO_MARKET_CHART_ENDPOINT,
        COINGECKO_SEARCH_ENDPOINT,
    },
    error::{ApiError, FetchError},
    provider::MarketDataProvider,
    retry::{RetryPolicy, RetryState},
    transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport},
    types::{Coin, CoinDetail, PriceHistory, SearchResults},
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::time::sleep;

/// CoinGecko client
pub struct CoinGeckoClient {
    transport: Arc<dyn HttpTransport>,
    retry: RetryPolicy,
    currency: String,
    auth_query: Option<(String, String)>,
}

impl CoinGeckoClient {
    /// Creates a client backed by reqwest for the given configuration
    pub fn new(config: &DashboardConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client over a custom transport
    ///
    /// This is primarily for testing with scripted transports.
    pub fn with_transport(config: &DashboardConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            currency: config.vs_currency.to_lowercase(),
            auth_query: config.auth_query(),
        }
    }

    /// Replaces the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Configured quote currency
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Adds the API key query parameter when one is configured
    fn authorize(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some((key, value)) = &self.auth_query {
            request.query.push((key.clone(), value.clone()));
        }
        request
    }

    /// Sends a request, retrying 429/5xx/timeouts per the retry policy
    async fn send_with_retry(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut state = RetryState::initial();

        loop {
            let error = match self.transport.get(request).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => {
                    ApiError::status(response.status, response.retry_after, response.body)
                }
                Err(e) => e,
            };

            match self.retry.next(state, &error) {
                Some((next, delay)) => {
                    tracing::debug!(
                        path = %request.path(),
                        retry = next.retries,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying upstream request"
                    );
                    sleep(delay).await;
                    state = next;
                }
                None => {
                    if state.retries > 0 {
                        tracing::warn!(
                            path = %request.path(),
                            retries = state.retries,
                            error = %error,
                            "Upstream request failed after retries"
                        );
                    }
                    return Err(error);
                }
            }
        }
    }

    /// Sends a request and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let request = self.authorize(request);
        let response = self.send_with_retry(&request).await?;

        serde_json::from_str(&response.body).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "Failed to parse {} response: {}. Response: {}",
                request.path(),
                e,
                response.body
            ))
        })
    }

    /// Logs the diagnostic error and returns the generic one
    fn collapse(error: ApiError, generic: FetchError, context: &str) -> FetchError {
        tracing::error!(error = %error, context, "{}", generic);
        generic
    }

    fn markets_request(&self, currency: &str) -> ApiRequest {
        let currency = if currency.trim().is_empty() {
            self.currency.clone()
        } else {
            currency.trim().to_lowercase()
        };
        ApiRequest::new(COINGECKO_MARKETS_ENDPOINT).param("vs_currency", currency)
    }
}

/// Rejects blank identifiers before any network call
fn require_id(id: &str) -> Result<&str, FetchError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(FetchError::invalid_argument("coin id must not be empty"));
    }
    Ok(id)
}

#[async_trait]
impl MarketDataProvider for CoinGeckoClient {
    async fn fetch_market_snapshot(
        &self,
        currency: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Coin>, FetchError> {
        if page == 0 || per_page == 0 {
            return Err(FetchError::invalid_argument(
                "page and per_page must be at least 1",
            ));
        }

        let request = self
            .markets_request(currency)
            .param("order", "market_cap_desc")
            .param("per_page", per_page)
            .param("page", page)
            .param("sparkline", true);

        let coins: Vec<Coin> = self
            .get_json(request)
            .await
            .map_err(|e| Self::collapse(e, FetchError::MarketData, "market snapshot"))?;

        tracing::debug!(count = coins.len(), page, per_page, "Fetched market snapshot");
        Ok(coins)
    }

    async fn fetch_markets_by_ids(
        &self,
        currency: &str,
        ids: &[&str],
    ) -> Result<Vec<Coin>, FetchError> {
        let ids: Vec<&str> = ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            return Err(FetchError::invalid_argument("at least one coin id is required"));
        }

        let request = self
            .markets_request(currency)
            .param("ids", ids.join(","))
            .param("sparkline", true);

        self.get_json(request)
            .await
            .map_err(|e| Self::collapse(e, FetchError::MarketData, "scoped market lookup"))
    }

    async fn search(&self, query: &str) -> Result<SearchResults, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FetchError::invalid_argument("search query must not be empty"));
        }

        let request = ApiRequest::new(COINGECKO_SEARCH_ENDPOINT).param("query", query);
        self.get_json(request)
            .await
            .map_err(|e| Self::collapse(e, FetchError::Search, "search"))
    }

    async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, FetchError> {
        let id = require_id(id)?;
        let request = ApiRequest::new(COINGECKO_COINS_ENDPOINT).segment(id);
        self.get_json(request)
            .await
            .map_err(|e| Self::collapse(e, FetchError::CoinDetail, "coin detail"))
    }

    async fn fetch_price_history(&self, id: &str, days: u32) -> Result<PriceHistory, FetchError> {
        let id = require_id(id)?;
        if days == 0 {
            return Err(FetchError::invalid_argument("days must be at least 1"));
        }

        let request = ApiRequest::new(COINGECKO_COINS_ENDPOINT)
            .segment(id)
            .segment(COINGECKO_MARKET_CHART_ENDPOINT)
            .param("vs_currency", &self.currency)
            .param("days", days);

        self.get_json(request)
            .await
            .map_err(|e| Self::collapse(e, FetchError::PriceHistory, "price history"))
    }

    fn default_currency(&self) -> &str {
        &self.currency
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}
