//! Market snapshot poller
//!
//! Fetches the snapshot, pins the featured coin and publishes the result as a
//! new [`DashboardState`]. Runs once on start and then on a fixed interval;
//! manual refreshes may overlap with scheduled ones.
//!
//! ```no_run
//! use market_dashboard_sdk::{DashboardConfig, MarketPoller};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let poller = MarketPoller::from_config(DashboardConfig::from_env())?;
//! let _task = poller.start();
//!
//! let mut states = poller.subscribe();
//! while states.changed().await.is_ok() {
//!     let state = states.borrow_and_update().clone();
//!     println!("{:?}: {} coins", state.status, state.coins.len());
//! }
//! # Ok(())
//! # }
//! ```

use crate::{
    client::CoinGeckoClient,
    config::DashboardConfig,
    constants::{DEFAULT_PAGE, DEFAULT_PER_PAGE, EVENT_CHANNEL_CAPACITY},
    error::{ApiError, FetchError},
    featured::FeaturedResolver,
    provider::MarketDataProvider,
    state::{DashboardState, Transition},
    types::{Coin, DashboardEvent},
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use uuid::Uuid;

/// Polls the market snapshot and publishes dashboard state
pub struct MarketPoller {
    provider: Arc<dyn MarketDataProvider>,
    resolver: FeaturedResolver,
    currency: String,
    page: u32,
    per_page: u32,
    refresh_interval: Duration,
    state_tx: watch::Sender<Arc<DashboardState>>,
    event_tx: broadcast::Sender<DashboardEvent>,
}

impl MarketPoller {
    /// Creates a poller backed by the CoinGecko client
    pub fn from_config(config: DashboardConfig) -> Result<Arc<Self>, ApiError> {
        let client = CoinGeckoClient::new(&config)?;
        Ok(Self::with_provider(Arc::new(client), &config))
    }

    /// Creates a poller over a custom provider
    ///
    /// This is primarily for testing with mock providers.
    pub fn with_provider(
        provider: Arc<dyn MarketDataProvider>,
        config: &DashboardConfig,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(Arc::new(DashboardState::default()));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Arc::new(Self {
            provider,
            resolver: FeaturedResolver::new(config.featured_coin.clone()),
            currency: config.vs_currency.clone(),
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            refresh_interval: config.refresh_interval,
            state_tx,
            event_tx,
        })
    }

    /// Starts the background polling task
    ///
    /// The first refresh runs immediately. Dropping the handle does not stop
    /// the task; abort it to stop polling.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let poller = Arc::clone(self);

        tokio::spawn(async move {
            tracing::info!(
                refresh_interval_secs = poller.refresh_interval.as_secs(),
                provider = poller.provider.provider_name(),
                "Starting market dashboard poller"
            );

            loop {
                if let Err(e) = poller.refresh_now().await {
                    tracing::warn!(error = %e, "Scheduled refresh failed");
                }

                sleep(poller.refresh_interval).await;
            }
        })
    }

    /// Forces an immediate refresh
    ///
    /// Returns the number of coins fetched, or the generic fetch error. The
    /// result is published only if no newer refresh has been applied.
    pub async fn refresh_now(&self) -> Result<usize, FetchError> {
        // Generations are issued and checked under the watch lock.
        let mut generation = 0;
        self.state_tx.send_modify(|state| {
            let loading = state.begin_loading();
            generation = loading.requested;
            *state = Arc::new(loading);
        });

        tracing::debug!(generation, "Refreshing market snapshot");
        let result = self.load_coins().await;
        let outcome = result.as_ref().map(Vec::len).map_err(Clone::clone);
        let featured = result
            .as_ref()
            .ok()
            .and_then(|coins| coins.first())
            .filter(|c| c.matches_token(self.resolver.target()))
            .map(|c| c.id.clone());

        let mut discarded_by = None;
        self.state_tx.send_if_modified(|state| {
            match state.complete(generation, result) {
                Transition::Applied(next) => {
                    *state = Arc::new(next);
                    true
                }
                Transition::Discarded { applied_generation } => {
                    discarded_by = Some(applied_generation);
                    false
                }
            }
        });

        let event = match (discarded_by, &outcome) {
            (Some(applied_generation), _) => {
                tracing::debug!(
                    generation,
                    applied_generation,
                    "Discarding stale refresh result"
                );
                DashboardEvent::RefreshDiscarded {
                    id: Uuid::new_v4(),
                    generation,
                    applied_generation,
                    timestamp: Utc::now(),
                }
            }
            (None, Ok(count)) => {
                tracing::debug!(
                    generation,
                    count = *count,
                    featured = featured.as_deref().unwrap_or("none"),
                    "Published market snapshot"
                );
                DashboardEvent::SnapshotUpdated {
                    id: Uuid::new_v4(),
                    generation,
                    coin_count: *count,
                    featured,
                    timestamp: Utc::now(),
                }
            }
            (None, Err(e)) => DashboardEvent::RefreshFailed {
                id: Uuid::new_v4(),
                generation,
                error_message: e.to_string(),
                timestamp: Utc::now(),
            },
        };
        // No subscribers is fine.
        let _ = self.event_tx.send(event);

        outcome
    }

    /// Snapshot fetch followed by featured coin resolution
    async fn load_coins(&self) -> Result<Vec<Coin>, FetchError> {
        let coins = self
            .provider
            .fetch_market_snapshot(&self.currency, self.page, self.per_page)
            .await?;

        Ok(self
            .resolver
            .resolve(self.provider.as_ref(), &self.currency, coins)
            .await)
    }

    /// Current state
    pub fn state(&self) -> Arc<DashboardState> {
        self.state_tx.borrow().clone()
    }

    /// Receiver notified on every state replacement
    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.state_tx.subscribe()
    }

    /// Receiver for dashboard events
    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.event_tx.subscribe()
    }

    /// Provider used for snapshots and detail views
    pub fn provider(&self) -> Arc<dyn MarketDataProvider> {
        Arc::clone(&self.provider)
    }

    /// Featured coin token
    pub fn featured_token(&self) -> &str {
        self.resolver.target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{coin, MockProvider};
    use crate::state::PollStatus;

    fn config(refresh_secs: u64) -> DashboardConfig {
        DashboardConfig {
            refresh_interval: Duration::from_secs(refresh_secs),
            ..DashboardConfig::default()
        }
    }

    #[tokio::test]
    async fn test_refresh_publishes_pinned_snapshot() {
        let provider = Arc::new(MockProvider::new());
        provider.push_snapshot(Ok(vec![
            coin("bitcoin", "btc", 1.0),
            coin("vanry", "vanry", 2.0),
        ]));
        let poller = MarketPoller::with_provider(provider.clone(), &config(30));
        let mut events = poller.subscribe_events();

        assert_eq!(poller.state().status, PollStatus::Idle);
        let count = poller.refresh_now().await.unwrap();

        let state = poller.state();
        assert_eq!(count, 2);
        assert_eq!(state.status, PollStatus::Ready);
        assert_eq!(state.coins[0].id, "vanry");
        assert_eq!(state.generation, 1);

        match events.recv().await.unwrap() {
            DashboardEvent::SnapshotUpdated {
                coin_count,
                featured,
                ..
            } => {
                assert_eq!(coin_count, 2);
                assert_eq!(featured.as_deref(), Some("vanry"));
            }
            other => panic!("unexpected event {}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_coins() {
        let provider = Arc::new(MockProvider::new());
        provider.push_snapshot(Ok(vec![coin("bitcoin", "btc", 1.0)]));
        provider.push_snapshot(Err(FetchError::MarketData));
        let poller = MarketPoller::with_provider(provider.clone(), &config(30));

        poller.refresh_now().await.unwrap();
        let err = poller.refresh_now().await.unwrap_err();

        let state = poller.state();
        assert_eq!(err, FetchError::MarketData);
        assert_eq!(state.status, PollStatus::Error);
        assert_eq!(state.coins.len(), 1);
        assert_eq!(
            state.error_message().as_deref(),
            Some("Failed to fetch cryptocurrency data")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_refreshes_keep_newest() {
        let provider = Arc::new(MockProvider::new());
        provider.push_snapshot(Ok(vec![coin("old", "old", 1.0)]));
        provider.push_snapshot(Ok(vec![coin("new", "new", 1.0)]));
        provider.push_snapshot_delay(Duration::from_secs(5));
        provider.push_snapshot_delay(Duration::from_secs(1));
        let poller = MarketPoller::with_provider(provider.clone(), &config(30));
        let mut events = poller.subscribe_events();

        let (first, second) = tokio::join!(poller.refresh_now(), poller.refresh_now());
        assert!(first.is_ok() && second.is_ok());

        let state = poller.state();
        assert_eq!(state.generation, 2);
        assert_eq!(state.status, PollStatus::Ready);
        assert_eq!(state.coins[0].id, "new");

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(event.event_type());
        }
        assert_eq!(kinds, vec!["SNAPSHOT_UPDATED", "REFRESH_DISCARDED"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshes_never_report_ready_early() {
        let provider = Arc::new(MockProvider::new());
        provider.push_snapshot(Ok(vec![coin("bitcoin", "btc", 1.0)]));
        let poller = MarketPoller::with_provider(provider.clone(), &config(30));

        let mut states = poller.subscribe();
        let watcher = tokio::spawn(async move {
            let mut early = 0;
            while states.changed().await.is_ok() {
                let state = states.borrow_and_update().clone();
                if state.status == PollStatus::Ready && state.generation < state.requested {
                    early += 1;
                }
            }
            early
        });

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let poller = Arc::clone(&poller);
                tokio::spawn(async move { poller.refresh_now().await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        let state = poller.state();
        assert_eq!(state.requested, 32);
        assert_eq!(state.generation, 32);
        assert_eq!(state.status, PollStatus::Ready);

        drop(poller);
        assert_eq!(watcher.await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_task_polls_on_interval() {
        let provider = Arc::new(MockProvider::new());
        provider.push_snapshot(Ok(vec![coin("bitcoin", "btc", 1.0)]));
        let poller = MarketPoller::with_provider(provider.clone(), &config(30));
        let mut states = poller.subscribe();

        let handle = poller.start();

        let first = states
            .wait_for(|s| s.status == PollStatus::Ready)
            .await
            .unwrap()
            .generation;
        assert_eq!(first, 1);

        tokio::time::sleep(Duration::from_secs(65)).await;
        handle.abort();

        let snapshots = provider
            .calls()
            .iter()
            .filter(|c| c.as_str() == "snapshot")
            .count();
        assert_eq!(snapshots, 3);
        assert_eq!(poller.state().generation, 3);
    }
}
