use std::time::Instant;
use tickerline::analytics::compute_indicators;
use tickerline::{Interval, MarketDataClient, MarketDataConfig, Period};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tickerline=info")),
        )
        .init();

    let ticker = std::env::args().nth(1).unwrap_or_else(|| "AAPL".to_string());
    let client = MarketDataClient::new(MarketDataConfig::from_env()?)?;

    println!("Quote for {} (provider: {})", ticker, client.provider_name());
    println!("-------------------------------------------");

    // 1. Network fetch
    let start_api = Instant::now();
    let info = client.fetch_info(&ticker).await;
    let api_latency = start_api.elapsed();

    let Some(info) = info else {
        eprintln!("   No data for {ticker}");
        return Ok(());
    };
    let name = info
        .get_str("longName")
        .or_else(|| info.get_str("shortName"))
        .unwrap_or(&ticker);
    println!("   Name:    {name}");
    match info.price() {
        Some(price) => println!("   Price:   {price:.2}"),
        None => println!("   Price:   n/a"),
    }
    println!("   Fetched in {api_latency:?}");
    println!();

    // 2. Same query again, answered from the cache
    let start_mem = Instant::now();
    let _ = client.fetch_info(&ticker).await;
    let cache_latency = start_mem.elapsed();
    println!("   Cached lookup in {cache_latency:?}");
    if cache_latency.as_nanos() > 0 {
        let speedup = api_latency.as_secs_f64() / cache_latency.as_secs_f64();
        println!("   The cache is approx. {speedup:.0}x faster than the network");
    }
    println!();

    // 3. Indicators over six months of daily bars
    match client
        .fetch_history(&ticker, Period::SixMonths, Interval::OneDay)
        .await
    {
        Some(history) => {
            let rows = compute_indicators(&history);
            println!("   {} daily bars", rows.len());
            if let Some(last) = rows.last() {
                println!(
                    "   Close {:.2}  SMA20 {:?}  SMA50 {:?}  RSI14 {:?}",
                    last.close, last.sma_20, last.sma_50, last.rsi_14
                );
            }
        }
        None => eprintln!("   History unavailable"),
    }

    println!("-------------------------------------------");
    let health = client.health_check().await;
    println!("Health: {:?} ({})", health.status, health.message.unwrap_or_default());

    Ok(())
}
