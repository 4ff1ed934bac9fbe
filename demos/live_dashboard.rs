use market_dashboard_sdk::{
    CoinDetailView, CoinFilter, CoinListView, DashboardConfig, MarketPoller, PollStatus, Sparkline,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Reads COINGECKO_PRO, COINGECKO_API_KEY, VS_CURRENCY, COINGECKO_BASE_URL
    // and DASHBOARD_REFRESH_SECS.
    let config = DashboardConfig::from_env();
    let currency = config.vs_currency.to_uppercase();
    let poller = MarketPoller::from_config(config)?;
    let task = poller.start();

    let mut states = poller.subscribe();
    for _ in 0..3 {
        let state = states
            .wait_for(|s| matches!(s.status, PollStatus::Ready | PollStatus::Error))
            .await?
            .clone();

        if let Some(message) = state.error_message() {
            eprintln!("Refresh #{} failed: {}", state.generation, message);
        }

        let view =
            CoinListView::build(&state.coins, "", CoinFilter::Gainers, poller.featured_token());
        if let Some(featured) = view.featured {
            let spark = Sparkline::for_coin(featured);
            println!(
                "Featured {} ({}): {:.6} {} [{}]",
                featured.name,
                featured.symbol.to_uppercase(),
                featured.current_price,
                currency,
                spark.summary.color()
            );
        }
        println!("{}", view.summary());
        for coin in view.coins.iter().take(5) {
            println!(
                "  {:<10} {:>14.4} {} {:>+7.2}%",
                coin.symbol.to_uppercase(),
                coin.current_price,
                currency,
                coin.price_change_percentage_24h
            );
        }

        if let Some(first) = state.coins.first() {
            match CoinDetailView::load_default(poller.provider().as_ref(), &first.id).await {
                Ok(detail) => {
                    if let Some(range) = detail.chart.summary.range {
                        println!(
                            "  {} 7d axis: {:.4} .. {:.4} ({:?})",
                            detail.detail.name, range.min, range.max, detail.chart.summary.trend
                        );
                    }
                }
                Err(e) => eprintln!("  {}", e),
            }
        }

        // Wait for the next refresh to start before looking again.
        states.wait_for(|s| s.is_loading()).await?;
    }

    task.abort();
    Ok(())
}
