//! Error types for the market dashboard

use std::time::Duration;
use thiserror::Error;

/// Errors produced while talking to the upstream API
///
/// These carry full diagnostic detail and stay inside the client; callers
/// only ever see a [`FetchError`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Request exceeded the per-request timeout
    #[error("Request timeout")]
    Timeout,

    /// Upstream answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status {
        status: u16,
        retry_after: Option<Duration>,
        body: String,
    },

    /// Payload could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client could not be configured (bad base URL, bad header value)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// Creates a Status error
    pub fn status(status: u16, retry_after: Option<Duration>, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            retry_after,
            body: body.into(),
        }
    }

    /// True for 429, any 5xx and request timeouts
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => *status == 429 || (500..=599).contains(status),
            ApiError::Timeout => true,
            ApiError::NetworkError(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Delay requested by upstream through `Retry-After`
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Errors surfaced to dashboard consumers
///
/// One short message per endpoint category. Upstream detail is logged by the
/// client, never carried here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Market snapshot (or scoped market lookup) failed
    #[error("Failed to fetch cryptocurrency data")]
    MarketData,

    /// Coin detail failed
    #[error("Failed to fetch coin details")]
    CoinDetail,

    /// Price history failed
    #[error("Failed to fetch price history")]
    PriceHistory,

    /// Free-text search failed
    #[error("Failed to search cryptocurrencies")]
    Search,

    /// Caller passed an argument the API cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl FetchError {
    /// Creates an InvalidArgument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
