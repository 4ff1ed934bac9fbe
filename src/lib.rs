//! # Market Dashboard SDK
//!
//! Data core of a live cryptocurrency price dashboard backed by the CoinGecko
//! REST API: market snapshots with a pinned featured coin, coin detail and
//! price history, chart-ready series, and a poller publishing dashboard state.
//!
//! Rendering is not part of this crate. It produces the data a UI draws.
//!
//! ## Usage
//!
//! ```no_run
//! use market_dashboard_sdk::{
//!     CoinDetailView, CoinFilter, CoinListView, DashboardConfig, MarketPoller, Sparkline,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let poller = MarketPoller::from_config(DashboardConfig::from_env())?;
//! poller.refresh_now().await?;
//!
//! let state = poller.state();
//! let token = poller.featured_token();
//! let view = CoinListView::build(&state.coins, "", CoinFilter::Gainers, token);
//! if let Some(featured) = view.featured {
//!     let spark = Sparkline::for_coin(featured);
//!     println!("{} ({})", featured.name, spark.summary.color());
//! }
//!
//! let detail = CoinDetailView::load_default(poller.provider().as_ref(), "bitcoin").await?;
//! println!("{} chart points", detail.chart.points.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! MarketPoller (initial + every 30s + manual)
//!     ↓
//! CoinGeckoClient (retry on 429/5xx/timeout)
//!     ↓
//! FeaturedResolver (pin / lookup / search)
//!     ↓
//! DashboardState (watch channel, whole-record swaps)
//!     ↓
//! CoinListView, Sparkline, CoinDetailView → PriceChart
//! ```
//!
//! ## Error Handling
//!
//! Every upstream failure reaches callers as a [`FetchError`] carrying one
//! short message per endpoint; the diagnostic detail is logged through
//! `tracing`. Featured coin resolution never fails a refresh.

pub mod chart;
pub mod client;
pub mod config;
pub mod constants;
pub mod detail;
pub mod error;
pub mod featured;
pub mod filter;
pub mod poller;
pub mod provider;
pub mod retry;
pub mod state;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use chart::{AxisRange, PriceChart, SeriesSummary, Sparkline, Trend};
pub use client::CoinGeckoClient;
pub use config::{ApiTier, DashboardConfig};
pub use detail::CoinDetailView;
pub use error::{ApiError, FetchError};
pub use featured::FeaturedResolver;
pub use filter::{CoinFilter, CoinListView};
pub use poller::MarketPoller;
pub use provider::MarketDataProvider;
pub use retry::RetryPolicy;
pub use state::{DashboardState, PollStatus};
pub use types::{Coin, CoinDetail, DashboardEvent, PriceHistory, PricePoint, SearchResults};
