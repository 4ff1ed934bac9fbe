//! Types for the market dashboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Treats an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One entry of a market snapshot (`/coins/markets`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    /// Upstream identifier, unique within a snapshot
    pub id: String,
    pub symbol: String,
    pub name: String,

    /// Image URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub current_price: f64,

    /// 24h price change in percent
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_change_percentage_24h: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub market_cap: f64,

    #[serde(default)]
    pub market_cap_rank: Option<u32>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub total_volume: f64,

    /// 7 day sparkline, only present when requested
    #[serde(default)]
    pub sparkline_in_7d: Option<SparklineIn7d>,
}

impl Coin {
    /// True if the id or symbol equals `token`, ignoring case
    pub fn matches_token(&self, token: &str) -> bool {
        self.id.eq_ignore_ascii_case(token) || self.symbol.eq_ignore_ascii_case(token)
    }

    /// Sparkline prices in chronological order, empty when absent
    pub fn sparkline_prices(&self) -> &[f64] {
        self.sparkline_in_7d
            .as_ref()
            .map(|s| s.price.as_slice())
            .unwrap_or(&[])
    }
}

/// Sparkline block of a market entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SparklineIn7d {
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: Vec<f64>,
}

/// Full coin detail (`/coins/{id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub image: CoinImage,

    #[serde(default)]
    pub market_cap_rank: Option<u32>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub market_data: MarketData,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: Description,
}

impl CoinDetail {
    /// English description, empty when upstream has none
    pub fn description_text(&self) -> &str {
        &self.description.en
    }
}

/// Image URLs at several resolutions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoinImage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumb: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub small: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub large: String,
}

/// Free-text description, keyed by language upstream; only English is kept
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Description {
    #[serde(default, deserialize_with = "null_as_default")]
    pub en: String,
}

/// Currency-keyed market block of a coin detail
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_price: HashMap<String, f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub high_24h: HashMap<String, f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub low_24h: HashMap<String, f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_cap: HashMap<String, f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_volume: HashMap<String, f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_change_percentage_24h: f64,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
}

impl MarketData {
    /// Current price in `currency`
    pub fn price_in(&self, currency: &str) -> Option<f64> {
        self.current_price.get(&currency.to_lowercase()).copied()
    }

    /// 24h (low, high) in `currency`
    pub fn range_24h_in(&self, currency: &str) -> Option<(f64, f64)> {
        let key = currency.to_lowercase();
        Some((*self.low_24h.get(&key)?, *self.high_24h.get(&key)?))
    }
}

/// A single `(timestamp, value)` sample
///
/// Upstream encodes these as two-element arrays `[epoch_ms, value]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(i64, f64)")]
pub struct PricePoint {
    /// Epoch milliseconds
    pub timestamp_ms: i64,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp_ms: i64, price: f64) -> Self {
        Self {
            timestamp_ms,
            price,
        }
    }

    /// Sample time as a UTC datetime
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp_ms)
    }
}

impl From<(f64, f64)> for PricePoint {
    fn from((timestamp, price): (f64, f64)) -> Self {
        Self::new(timestamp.round() as i64, price)
    }
}

impl From<PricePoint> for (i64, f64) {
    fn from(point: PricePoint) -> Self {
        (point.timestamp_ms, point.price)
    }
}

/// Historical series (`/coins/{id}/market_chart`), chronological
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceHistory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub prices: Vec<PricePoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_caps: Vec<PricePoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_volumes: Vec<PricePoint>,
}

impl PriceHistory {
    /// Price values without timestamps
    pub fn price_values(&self) -> Vec<f64> {
        self.prices.iter().map(|p| p.price).collect()
    }
}

/// Response of the free-text search endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default, deserialize_with = "null_as_default")]
    pub coins: Vec<SearchCoin>,
}

/// Coin candidate returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCoin {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub thumb: Option<String>,
}

/// Dashboard events published by the poller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DashboardEvent {
    /// A refresh completed and its snapshot was published
    SnapshotUpdated {
        id: Uuid,
        generation: u64,
        coin_count: usize,
        featured: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// A refresh failed and its error was published
    RefreshFailed {
        id: Uuid,
        generation: u64,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A refresh finished after a newer one had already been applied
    RefreshDiscarded {
        id: Uuid,
        generation: u64,
        applied_generation: u64,
        timestamp: DateTime<Utc>,
    },
}

impl DashboardEvent {
    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            DashboardEvent::SnapshotUpdated { id, .. } => *id,
            DashboardEvent::RefreshFailed { id, .. } => *id,
            DashboardEvent::RefreshDiscarded { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            DashboardEvent::SnapshotUpdated { .. } => "SNAPSHOT_UPDATED",
            DashboardEvent::RefreshFailed { .. } => "REFRESH_FAILED",
            DashboardEvent::RefreshDiscarded { .. } => "REFRESH_DISCARDED",
        }
    }
}

impl std::fmt::Display for DashboardEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardEvent::SnapshotUpdated {
                generation,
                coin_count,
                featured,
                ..
            } => write!(
                f,
                "Snapshot #{} updated: {} coins (featured: {})",
                generation,
                coin_count,
                featured.as_deref().unwrap_or("none")
            ),
            DashboardEvent::RefreshFailed {
                generation,
                error_message,
                ..
            } => write!(f, "Refresh #{} failed: {}", generation, error_message),
            DashboardEvent::RefreshDiscarded {
                generation,
                applied_generation,
                ..
            } => write!(
                f,
                "Refresh #{} discarded, #{} already applied",
                generation, applied_generation
            ),
        }
    }
}
