//! End-to-end flow through the public API: poller → client → resolver → state,
//! with upstream answered by an in-process routing transport.

use async_trait::async_trait;
use market_dashboard_sdk::transport::{ApiRequest, ApiResponse, HttpTransport};
use market_dashboard_sdk::{
    ApiError, CoinDetailView, CoinFilter, CoinGeckoClient, CoinListView, DashboardConfig,
    MarketPoller, PollStatus, Trend,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SNAPSHOT: &str = r#"[
    {"id":"bitcoin","symbol":"btc","name":"Bitcoin","image":"b.png","current_price":65000,
     "price_change_percentage_24h":2.5,"market_cap":1.2e12,"market_cap_rank":1,"total_volume":3e10,
     "sparkline_in_7d":{"price":[60000,62000,65000]}},
    {"id":"ethereum","symbol":"eth","name":"Ethereum","image":"e.png","current_price":3000,
     "price_change_percentage_24h":-1.25,"market_cap":3.6e11,"market_cap_rank":2,"total_volume":1e10,
     "sparkline_in_7d":{"price":[3100,3050,3000]}}
]"#;

const VANRY: &str = r#"[
    {"id":"vanar-chain","symbol":"vanry","name":"Vanar Chain","image":"v.png","current_price":0.031,
     "price_change_percentage_24h":4.0,"market_cap":6.1e7,"market_cap_rank":600,"total_volume":2e6,
     "sparkline_in_7d":{"price":[0.031,0.031]}}
]"#;

const SEARCH: &str = r#"{"coins":[
    {"id":"vanar-chain","name":"Vanar Chain","symbol":"VANRY","market_cap_rank":600,"thumb":"t.png"}
]}"#;

const DETAIL: &str = r#"{
    "id":"bitcoin","symbol":"btc","name":"Bitcoin",
    "image":{"thumb":"t.png","small":"s.png","large":"l.png"},
    "market_cap_rank":1,
    "market_data":{"current_price":{"usd":65000},"high_24h":{"usd":66000},"low_24h":{"usd":64000},
                   "market_cap":{"usd":1.2e12},"total_volume":{"usd":3e10},
                   "price_change_percentage_24h":2.5,"circulating_supply":19700000,"total_supply":21000000},
    "description":{"en":"Peer-to-peer electronic cash."}
}"#;

const HISTORY: &str = r#"{"prices":[[1700000000000,60000],[1700086400000,62000],[1700172800000,65000]]}"#;

/// Answers like the upstream API; the first snapshot request gets a 503
struct RoutingTransport {
    snapshot_calls: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

impl RoutingTransport {
    fn new() -> Self {
        Self {
            snapshot_calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }

    fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for RoutingTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let path = request.path();
        self.paths.lock().unwrap().push(path.clone());

        let body = match (path.as_str(), request.query_value("ids")) {
            ("coins/markets", None) => {
                if self.snapshot_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Ok(ApiResponse {
                        status: 503,
                        retry_after: None,
                        body: "upstream busy".to_string(),
                    });
                }
                SNAPSHOT
            }
            ("coins/markets", Some("vanar-chain")) => VANRY,
            ("coins/markets", Some(_)) => "[]",
            ("search", _) => SEARCH,
            ("coins/bitcoin", _) => DETAIL,
            ("coins/bitcoin/market_chart", _) => HISTORY,
            _ => {
                return Ok(ApiResponse {
                    status: 404,
                    retry_after: None,
                    body: "not found".to_string(),
                })
            }
        };

        Ok(ApiResponse::ok(body))
    }
}

#[tokio::test(start_paused = true)]
async fn refresh_pins_featured_coin_found_through_search() {
    let transport = Arc::new(RoutingTransport::new());
    let config = DashboardConfig {
        refresh_interval: Duration::from_secs(30),
        ..DashboardConfig::default()
    };
    let client = CoinGeckoClient::with_transport(&config, transport.clone());
    let poller = MarketPoller::with_provider(Arc::new(client), &config);

    let count = poller.refresh_now().await.unwrap();
    let state = poller.state();

    assert_eq!(count, 3);
    assert_eq!(state.status, PollStatus::Ready);
    let ids: Vec<&str> = state.coins.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["vanar-chain", "bitcoin", "ethereum"]);
    assert_eq!(
        transport.paths(),
        vec![
            "coins/markets",
            "coins/markets",
            "coins/markets",
            "search",
            "coins/markets"
        ]
    );

    let view = CoinListView::build(&state.coins, "", CoinFilter::Losers, poller.featured_token());
    assert_eq!(view.featured.map(|c| c.id.as_str()), Some("vanar-chain"));
    assert_eq!(view.coins.len(), 1);
    assert_eq!(view.coins[0].id, "ethereum");
}

#[tokio::test]
async fn detail_view_loads_chart() {
    let transport = Arc::new(RoutingTransport::new());
    let client = CoinGeckoClient::with_transport(&DashboardConfig::default(), transport);

    let view = CoinDetailView::load(&client, "bitcoin", 7).await.unwrap();

    assert_eq!(view.detail.description_text(), "Peer-to-peer electronic cash.");
    assert_eq!(view.chart.points.len(), 3);
    assert_eq!(view.chart.summary.trend, Trend::Positive);
    let range = view.chart.summary.range.unwrap();
    assert!((range.min - 59_500.0).abs() < 1e-6);
    assert!((range.max - 65_500.0).abs() < 1e-6);
}

#[tokio::test]
async fn detail_view_for_unknown_coin_reports_generic_error() {
    let transport = Arc::new(RoutingTransport::new());
    let client = CoinGeckoClient::with_transport(&DashboardConfig::default(), transport);

    let err = CoinDetailView::load(&client, "unknown", 7).await.unwrap_err();
    let message = err.to_string();

    assert!(
        message == "Failed to fetch coin details" || message == "Failed to fetch price history"
    );
}
