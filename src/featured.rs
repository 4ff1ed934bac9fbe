//! Featured coin resolution
//!
//! Guarantees the featured coin sits at position 0 of a snapshot, exactly
//! once, whenever it can be found:
//!
//! 1. Already in the snapshot (by id or symbol): move it to the front.
//! 2. Otherwise look it up directly by id through a scoped market call.
//! 3. Otherwise search for it, then look up the resolved id.
//!
//! Steps 2 and 3 share one time budget. Every failure is logged and
//! absorbed; the caller then gets the snapshot back unchanged.

use crate::{
    constants::{FEATURED_COIN, FEATURED_FALLBACK_BUDGET_SECS},
    provider::MarketDataProvider,
    types::{Coin, SearchCoin},
};
use std::time::Duration;
use tokio::time::timeout;

/// Pins a designated coin to the front of market snapshots
#[derive(Debug, Clone)]
pub struct FeaturedResolver {
    target: String,
    fallback_budget: Duration,
}

impl Default for FeaturedResolver {
    fn default() -> Self {
        Self::new(FEATURED_COIN)
    }
}

impl FeaturedResolver {
    /// Creates a resolver for the given id/symbol token
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into().trim().to_lowercase(),
            fallback_budget: Duration::from_secs(FEATURED_FALLBACK_BUDGET_SECS),
        }
    }

    /// Overrides the combined budget for the fallback lookups
    pub fn with_fallback_budget(mut self, budget: Duration) -> Self {
        self.fallback_budget = budget;
        self
    }

    /// The lower-cased target token
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns `coins` with the featured coin first, fetching it if missing
    pub async fn resolve(
        &self,
        provider: &dyn MarketDataProvider,
        currency: &str,
        coins: Vec<Coin>,
    ) -> Vec<Coin> {
        let coins = match pin_existing(coins, &self.target) {
            Ok(pinned) => return pinned,
            Err(unchanged) => unchanged,
        };

        tracing::debug!(
            target_coin = %self.target,
            "Featured coin missing from snapshot, looking it up"
        );

        match timeout(self.fallback_budget, self.lookup(provider, currency)).await {
            Ok(Some(featured)) => {
                tracing::debug!(id = %featured.id, "Resolved featured coin out of band");
                prepend_deduped(coins, featured)
            }
            Ok(None) => {
                tracing::warn!(
                    target_coin = %self.target,
                    "Featured coin could not be resolved, returning snapshot without it"
                );
                coins
            }
            Err(_) => {
                tracing::warn!(
                    target_coin = %self.target,
                    budget_ms = self.fallback_budget.as_millis() as u64,
                    "Featured coin lookup exceeded its budget, returning snapshot without it"
                );
                coins
            }
        }
    }

    /// Direct lookup by id, then search-and-lookup
    async fn lookup(&self, provider: &dyn MarketDataProvider, currency: &str) -> Option<Coin> {
        match provider.fetch_markets_by_ids(currency, &[self.target.as_str()]).await {
            Ok(found) => {
                if let Some(coin) = found.into_iter().next() {
                    return Some(coin);
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Direct featured coin lookup failed");
            }
        }

        let results = match provider.search(&self.target).await {
            Ok(results) => results,
            Err(e) => {
                tracing::debug!(error = %e, "Featured coin search failed");
                return None;
            }
        };

        let candidate = find_search_match(&results.coins, &self.target)?;
        tracing::debug!(
            resolved_id = %candidate.id,
            "Featured coin id resolved through search"
        );

        match provider
            .fetch_markets_by_ids(currency, &[candidate.id.as_str()])
            .await
        {
            Ok(found) => found.into_iter().next(),
            Err(e) => {
                tracing::debug!(error = %e, "Lookup of resolved featured coin id failed");
                None
            }
        }
    }
}

/// Moves the entry matching `target` (id or symbol) to position 0
///
/// Any later entry sharing the pinned entry's id is dropped. Returns the
/// untouched list as `Err` when nothing matches.
pub fn pin_existing(mut coins: Vec<Coin>, target: &str) -> Result<Vec<Coin>, Vec<Coin>> {
    let Some(index) = coins.iter().position(|c| c.matches_token(target)) else {
        return Err(coins);
    };

    let featured = coins.remove(index);
    Ok(prepend_deduped(coins, featured))
}

/// Prepends `featured`, removing any entry with the same id
pub fn prepend_deduped(coins: Vec<Coin>, featured: Coin) -> Vec<Coin> {
    let mut result = Vec::with_capacity(coins.len() + 1);
    let featured_id = featured.id.clone();
    result.push(featured);
    result.extend(
        coins
            .into_iter()
            .filter(|c| !c.id.eq_ignore_ascii_case(&featured_id)),
    );
    result
}

/// First search candidate whose id contains, symbol equals, or name contains
/// the target token (case-insensitive)
pub fn find_search_match<'a>(candidates: &'a [SearchCoin], target: &str) -> Option<&'a SearchCoin> {
    let target = target.to_lowercase();
    candidates.iter().find(|c| {
        c.id.to_lowercase().contains(&target)
            || c.symbol.eq_ignore_ascii_case(&target)
            || c.name.to_lowercase().contains(&target)
    })
}
