//! # Tickerline
//!
//! Cached, rate-limited and retrying access to stock and crypto market data
//! (Yahoo Finance chart API, CoinGecko).
//!
//! Every consumer (dashboard views, portfolio valuation, the watchlist
//! monitor) goes through one [`MarketDataClient`]. It answers from a
//! short-lived in-memory cache when it can, spaces outbound calls by a
//! minimum interval, and retries throttled or failed calls a bounded number
//! of times. Failures never escape as errors: the caller gets `None` and a
//! log line.
//!
//! ## Usage
//!
//! Build the client once and clone it wherever it is needed; clones share
//! the cache and the rate limiter:
//!
//! ```no_run
//! use tickerline::{analytics, Interval, MarketDataClient, MarketDataConfig, Period};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MarketDataClient::new(MarketDataConfig::from_env()?)?;
//!
//! match client.fetch_info("AAPL").await {
//!     Some(info) => println!("AAPL: {:?}", info.price()),
//!     None => println!("AAPL unavailable"),
//! }
//!
//! if let Some(rows) =
//!     analytics::historical_indicators(&client, "AAPL", Period::SixMonths, Interval::OneDay).await
//! {
//!     if let Some(last) = rows.last() {
//!         println!("RSI(14): {:?}", last.rsi_14);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod portfolio;
pub mod provider;
pub mod providers;
pub mod rate_limiter;
pub mod retry;
pub mod types;
pub mod watchlist;

// Re-export commonly used types
pub use client::MarketDataClient;
pub use config::{MarketDataConfig, ProviderKind};
pub use error::{ConfigError, ParseError, ProviderError};
pub use metrics::ProviderMetrics;
pub use portfolio::{Holding, PortfolioManager, PortfolioSummary, PositionValuation};
pub use provider::MarketDataProvider;
pub use retry::RetryPolicy;
pub use types::{Bar, ComponentHealth, HealthStatus, History, Interval, Period, TickerInfo};
pub use watchlist::{PriceAlert, PriceMonitor, Watchlists};
