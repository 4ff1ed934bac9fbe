//! Startup configuration for the dashboard
//!
//! Read once from the environment. Anything not listed here is a compile-time
//! constant in `constants`.
//!
//! | Variable                 | Meaning                                     |
//! |--------------------------|---------------------------------------------|
//! | `COINGECKO_PRO`          | `"true"` selects the Pro tier               |
//! | `COINGECKO_API_KEY`      | Optional API key                            |
//! | `VS_CURRENCY`            | Quote currency, defaults to `usd`           |
//! | `COINGECKO_BASE_URL`     | Overrides the tier's base URL               |
//! | `DASHBOARD_REFRESH_SECS` | Poll interval in seconds, defaults to 30    |

use crate::constants::{
    COINGECKO_PRO_API_URL, COINGECKO_PUBLIC_API_URL, DEFAULT_VS_CURRENCY, FEATURED_COIN,
    REFRESH_INTERVAL_SECS,
};
use std::time::Duration;

/// CoinGecko account tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiTier {
    /// Public API, optionally with a demo key
    #[default]
    Demo,
    /// Paid API
    Pro,
}

impl ApiTier {
    /// Default base URL for this tier
    pub fn base_url(&self) -> &'static str {
        match self {
            ApiTier::Demo => COINGECKO_PUBLIC_API_URL,
            ApiTier::Pro => COINGECKO_PRO_API_URL,
        }
    }

    /// Header carrying the API key
    pub fn header_name(&self) -> &'static str {
        match self {
            ApiTier::Demo => "x-cg-demo-api-key",
            ApiTier::Pro => "x-cg-pro-api-key",
        }
    }

    /// Query parameter duplicating the API key
    pub fn query_param(&self) -> &'static str {
        match self {
            ApiTier::Demo => "x_cg_demo_api_key",
            ApiTier::Pro => "x_cg_pro_api_key",
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub tier: ApiTier,
    pub api_key: Option<String>,
    /// Lower-cased quote currency
    pub vs_currency: String,
    pub base_url: String,
    pub refresh_interval: Duration,
    pub featured_coin: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tier: ApiTier::Demo,
            api_key: None,
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
            base_url: ApiTier::Demo.base_url().to_string(),
            refresh_interval: Duration::from_secs(REFRESH_INTERVAL_SECS),
            featured_coin: FEATURED_COIN.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Reads the configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let tier = match non_empty("COINGECKO_PRO") {
            Some(flag) if flag.eq_ignore_ascii_case("true") => ApiTier::Pro,
            _ => ApiTier::Demo,
        };

        let vs_currency = non_empty("VS_CURRENCY")
            .map(|c| c.to_lowercase())
            .unwrap_or_else(|| DEFAULT_VS_CURRENCY.to_string());

        let base_url = non_empty("COINGECKO_BASE_URL")
            .unwrap_or_else(|| tier.base_url().to_string());

        let refresh_interval = match non_empty("DASHBOARD_REFRESH_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(
                        value = %raw,
                        default_secs = REFRESH_INTERVAL_SECS,
                        "Ignoring invalid DASHBOARD_REFRESH_SECS"
                    );
                    Duration::from_secs(REFRESH_INTERVAL_SECS)
                }
            },
            None => Duration::from_secs(REFRESH_INTERVAL_SECS),
        };

        Self {
            tier,
            api_key: non_empty("COINGECKO_API_KEY"),
            vs_currency,
            base_url,
            refresh_interval,
            featured_coin: FEATURED_COIN.to_string(),
        }
    }

    /// Overrides the base URL (useful for local mirrors)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Query parameter pair duplicating the API key, if a key is configured
    pub fn auth_query(&self) -> Option<(String, String)> {
        self.api_key
            .as_ref()
            .map(|key| (self.tier.query_param().to_string(), key.clone()))
    }
}
