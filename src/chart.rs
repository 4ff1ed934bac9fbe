//! Chart series derivation
//!
//! Turns raw price samples into what a chart needs: points, a padded value
//! axis and a trend colour. Everything here is a pure function of its input.

use crate::{
    constants::{
        FLAT_SERIES_PAD_RATIO, NEGATIVE_COLOR, NEUTRAL_COLOR, POSITIVE_COLOR, SPREAD_PAD_RATIO,
        ZERO_SERIES_PAD,
    },
    types::{Coin, PriceHistory},
};
use serde::Serialize;

/// Value-axis bounds with padding applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    /// Padded range over the finite values of a series
    ///
    /// A flat series is padded by 2% of its value (1.0 when the value is 0),
    /// anything else by 10% of its spread. Returns `None` for a series with
    /// no finite values.
    pub fn padded<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;

        let pad = if min == max {
            if min == 0.0 {
                ZERO_SERIES_PAD
            } else {
                (min * FLAT_SERIES_PAD_RATIO).abs()
            }
        } else {
            (max - min) * SPREAD_PAD_RATIO
        };

        Some(Self {
            min: min - pad,
            max: max + pad,
        })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Direction of a series, first sample to last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Positive,
    Negative,
    /// Fewer than two samples, or all samples equal
    Neutral,
}

impl Trend {
    /// Trend of a chronological series, ignoring non-finite samples
    pub fn of(values: &[f64]) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let (Some(first), Some(last)) = (finite.first(), finite.last()) else {
            return Trend::Neutral;
        };
        if finite.len() < 2 || finite.iter().all(|v| v == first) {
            return Trend::Neutral;
        }
        if last >= first {
            Trend::Positive
        } else {
            Trend::Negative
        }
    }

    /// Hex colour used to draw the series
    pub fn color(&self) -> &'static str {
        match self {
            Trend::Positive => POSITIVE_COLOR,
            Trend::Negative => NEGATIVE_COLOR,
            Trend::Neutral => NEUTRAL_COLOR,
        }
    }
}

/// Range and trend of one series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub range: Option<AxisRange>,
    pub trend: Trend,
}

impl SeriesSummary {
    pub fn derive(values: &[f64]) -> Self {
        Self {
            range: AxisRange::padded(values.iter().copied()),
            trend: Trend::of(values),
        }
    }

    pub fn color(&self) -> &'static str {
        self.trend.color()
    }
}

/// Point of a sparkline, positioned by sample index
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SparkPoint {
    pub x: usize,
    pub y: f64,
}

/// Mini chart drawn inside a list entry from the 7 day sparkline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sparkline {
    pub points: Vec<SparkPoint>,
    pub summary: SeriesSummary,
}

impl Sparkline {
    pub fn from_prices(prices: &[f64]) -> Self {
        Self {
            points: prices
                .iter()
                .enumerate()
                .map(|(x, &y)| SparkPoint { x, y })
                .collect(),
            summary: SeriesSummary::derive(prices),
        }
    }

    /// Sparkline of a market entry; empty when the entry carries none
    pub fn for_coin(coin: &Coin) -> Self {
        Self::from_prices(coin.sparkline_prices())
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Point of the detail chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp_ms: i64,
    /// UTC calendar date, `YYYY-MM-DD`
    pub date: String,
    pub price: f64,
}

/// Full-resolution chart for the detail view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChart {
    pub points: Vec<ChartPoint>,
    pub summary: SeriesSummary,
}

impl PriceChart {
    pub fn from_history(history: &PriceHistory) -> Self {
        let points = history
            .prices
            .iter()
            .map(|p| ChartPoint {
                timestamp_ms: p.timestamp_ms,
                date: p
                    .time()
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                price: p.price,
            })
            .collect();

        Self {
            points,
            summary: SeriesSummary::derive(&history.price_values()),
        }
    }
}
