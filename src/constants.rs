//! Constants for the market data access layer
//!
//! These are the compile-time defaults. `MarketDataConfig::from_env` can
//! override the tunable ones at startup.

/// How long a cached info or history payload stays fresh (in seconds)
pub const CACHE_DURATION_SECS: u64 = 60;

/// Minimum spacing between two outbound upstream requests (in milliseconds)
pub const MIN_REQUEST_INTERVAL_MS: u64 = 500;

/// Number of retries after the first attempt
pub const MAX_RETRIES: u32 = 3;

/// Base delay for rate-limit backoff; retry `n` waits `base * 2^(n-1)` (in seconds)
pub const RATE_LIMIT_BACKOFF_BASE_SECS: u64 = 2;

/// Flat delay before retrying a non rate-limit fault (in seconds)
pub const TRANSIENT_RETRY_DELAY_SECS: u64 = 1;

/// HTTP request timeout when talking to a provider (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Info fields that carry a usable price, checked in this order
pub const PRICE_FIELDS: &[&str] = &[
    "currentPrice",
    "regularMarketPrice",
    "previousClose",
    "regularMarketPreviousClose",
    "ask",
    "bid",
];

/// Info fields that identify the instrument even without a price
pub const IDENTITY_FIELDS: &[&str] = &["longName", "shortName", "symbol"];

/// Yahoo Finance chart API base URL
pub const YAHOO_CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for simple price queries
pub const COINGECKO_SIMPLE_PRICE_ENDPOINT: &str = "/simple/price";

/// Quote currency used for CoinGecko lookups
pub const COINGECKO_VS_CURRENCY: &str = "usd";

/// Default watchlist monitor period (in seconds)
pub const MONITOR_INTERVAL_SECS: u64 = 60;

/// Delay before the first watchlist monitor pass (in seconds)
pub const MONITOR_FIRST_DELAY_SECS: u64 = 10;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; tickerline/0.1.0)";
