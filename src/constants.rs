//! Constants for the market dashboard
//!
//! Defaults for everything that is not read from the environment live here.
//! See `config` for the handful of values that can be overridden at startup.

/// How often the poller refreshes the market snapshot (in seconds)
pub const REFRESH_INTERVAL_SECS: u64 = 30;

/// HTTP request timeout for a single upstream call (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum number of retries after the initial attempt
pub const MAX_RETRIES: u32 = 3;

/// Backoff before the first retry when upstream gives no Retry-After (in milliseconds)
pub const INITIAL_BACKOFF_MS: u64 = 500;

/// Longest Retry-After honoured; larger values fall back to backoff (in seconds)
pub const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Combined budget for the featured coin fallback lookups (in seconds)
pub const FEATURED_FALLBACK_BUDGET_SECS: u64 = 20;

/// Coin pinned to the front of every snapshot
pub const FEATURED_COIN: &str = "vanry";

/// Currency prices are quoted in unless configured otherwise
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// Snapshot page fetched by the poller
pub const DEFAULT_PAGE: u32 = 1;

/// Snapshot page size fetched by the poller
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Lookback window for the detail chart (in days)
pub const DEFAULT_HISTORY_DAYS: u32 = 7;

/// CoinGecko public/demo API base URL
pub const COINGECKO_PUBLIC_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko Pro API base URL
pub const COINGECKO_PRO_API_URL: &str = "https://pro-api.coingecko.com/api/v3";

/// Market snapshot endpoint
pub const COINGECKO_MARKETS_ENDPOINT: &str = "coins/markets";

/// Coin endpoint prefix, followed by `{id}` and optionally `market_chart`
pub const COINGECKO_COINS_ENDPOINT: &str = "coins";

/// Historical chart endpoint suffix
pub const COINGECKO_MARKET_CHART_ENDPOINT: &str = "market_chart";

/// Free-text search endpoint
pub const COINGECKO_SEARCH_ENDPOINT: &str = "search";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "market-dashboard-sdk/0.1.0";

/// Fraction of the value used to pad a flat series
pub const FLAT_SERIES_PAD_RATIO: f64 = 0.02;

/// Padding used for a flat series sitting exactly at zero
pub const ZERO_SERIES_PAD: f64 = 1.0;

/// Fraction of the spread added above and below a varying series
pub const SPREAD_PAD_RATIO: f64 = 0.1;

/// Chart colour for a rising series
pub const POSITIVE_COLOR: &str = "#10b981";

/// Chart colour for a falling series
pub const NEGATIVE_COLOR: &str = "#ef4444";

/// Chart colour for a flat or too-short series
pub const NEUTRAL_COLOR: &str = "#6b7280";

/// Capacity of the dashboard event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;
