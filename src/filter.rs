//! List shaping for the coin grid

use crate::types::Coin;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Category tab applied to the coin list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinFilter {
    /// Upstream order
    #[default]
    All,
    /// Positive 24h change, biggest first
    Gainers,
    /// Negative 24h change, biggest drop first
    Losers,
}

impl CoinFilter {
    /// Tab label
    pub fn label(&self) -> &'static str {
        match self {
            CoinFilter::All => "All",
            CoinFilter::Gainers => "Top Gainers",
            CoinFilter::Losers => "Top Losers",
        }
    }

    pub fn all() -> &'static [CoinFilter] {
        &[CoinFilter::All, CoinFilter::Gainers, CoinFilter::Losers]
    }
}

/// The featured card plus the filtered grid below it
#[derive(Debug, Clone, PartialEq)]
pub struct CoinListView<'a> {
    /// Shown regardless of search and filter
    pub featured: Option<&'a Coin>,
    /// Filtered entries, featured coin excluded
    pub coins: Vec<&'a Coin>,
}

impl<'a> CoinListView<'a> {
    /// Splits out the featured coin and filters the rest
    ///
    /// # Arguments
    /// * `coins` - Snapshot in upstream order
    /// * `search` - Case-insensitive substring of name or symbol; blank matches all
    /// * `filter` - Category tab
    /// * `featured_token` - Id or symbol of the featured coin
    pub fn build(
        coins: &'a [Coin],
        search: &str,
        filter: CoinFilter,
        featured_token: &str,
    ) -> Self {
        let featured = coins.iter().find(|c| c.matches_token(featured_token));
        let needle = search.trim().to_lowercase();

        let mut list: Vec<&Coin> = coins
            .iter()
            .filter(|c| !c.matches_token(featured_token))
            .filter(|c| {
                needle.is_empty()
                    || c.name.to_lowercase().contains(&needle)
                    || c.symbol.to_lowercase().contains(&needle)
            })
            .collect();

        match filter {
            CoinFilter::All => {}
            CoinFilter::Gainers => {
                list.retain(|c| c.price_change_percentage_24h > 0.0);
                list.sort_by(|a, b| {
                    b.price_change_percentage_24h
                        .partial_cmp(&a.price_change_percentage_24h)
                        .unwrap_or(Ordering::Equal)
                });
            }
            CoinFilter::Losers => {
                list.retain(|c| c.price_change_percentage_24h < 0.0);
                list.sort_by(|a, b| {
                    a.price_change_percentage_24h
                        .partial_cmp(&b.price_change_percentage_24h)
                        .unwrap_or(Ordering::Equal)
                });
            }
        }

        Self {
            featured,
            coins: list,
        }
    }

    /// True when nothing matched (the featured card does not count)
    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// "Showing N cryptocurrencies" style count line
    pub fn summary(&self) -> String {
        let noun = if self.coins.len() == 1 {
            "cryptocurrency"
        } else {
            "cryptocurrencies"
        };
        format!("Showing {} {}", self.coins.len(), noun)
    }
}
