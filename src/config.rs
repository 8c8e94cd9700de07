//! Runtime configuration for the market data access layer
//!
//! Defaults come from `constants`. A host can override them through
//! environment variables at startup:
//!
//! - `TICKERLINE_CACHE_DURATION_SECS`
//! - `TICKERLINE_MIN_REQUEST_INTERVAL_MS`
//! - `TICKERLINE_MAX_RETRIES`
//! - `TICKERLINE_PROVIDER` (`yahoo`, `coingecko` or `failover`)
//! - `TICKERLINE_QUOTE_CURRENCY` (CoinGecko quote currency, e.g. `eur`)

use crate::constants::{
    CACHE_DURATION_SECS, COINGECKO_VS_CURRENCY, MAX_RETRIES, MIN_REQUEST_INTERVAL_MS, RATE_LIMIT_BACKOFF_BASE_SECS,
    TRANSIENT_RETRY_DELAY_SECS,
};
use crate::error::ConfigError;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_CACHE_DURATION_SECS: &str = "TICKERLINE_CACHE_DURATION_SECS";
pub const ENV_MIN_REQUEST_INTERVAL_MS: &str = "TICKERLINE_MIN_REQUEST_INTERVAL_MS";
pub const ENV_MAX_RETRIES: &str = "TICKERLINE_MAX_RETRIES";
pub const ENV_PROVIDER: &str = "TICKERLINE_PROVIDER";
pub const ENV_QUOTE_CURRENCY: &str = "TICKERLINE_QUOTE_CURRENCY";

/// Which upstream the default client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Yahoo Finance chart API
    Yahoo,
    /// CoinGecko, tickers are coin ids
    CoinGecko,
    /// Yahoo first, CoinGecko when Yahoo fails
    Failover,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "coingecko" => Ok(Self::CoinGecko),
            "failover" => Ok(Self::Failover),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Tunables for `MarketDataClient`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    /// How long a cached payload stays fresh
    pub cache_duration: Duration,
    /// Minimum spacing between outbound requests
    pub min_request_interval: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base of the rate-limit backoff (`base * 2^(retry-1)`)
    pub rate_limit_backoff_base: Duration,
    /// Flat wait before retrying any other fault
    pub transient_retry_delay: Duration,
    pub provider: ProviderKind,
    /// Currency CoinGecko quotes in (lower-case ISO code)
    pub quote_currency: String,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            cache_duration: Duration::from_secs(CACHE_DURATION_SECS),
            min_request_interval: Duration::from_millis(MIN_REQUEST_INTERVAL_MS),
            max_retries: MAX_RETRIES,
            rate_limit_backoff_base: Duration::from_secs(RATE_LIMIT_BACKOFF_BASE_SECS),
            transient_retry_delay: Duration::from_secs(TRANSIENT_RETRY_DELAY_SECS),
            provider: ProviderKind::Yahoo,
            quote_currency: COINGECKO_VS_CURRENCY.to_string(),
        }
    }
}

impl MarketDataConfig {
    /// Defaults overridden by any `TICKERLINE_*` variables that are set
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reading from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_CACHE_DURATION_SECS)? {
            config.cache_duration = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_MIN_REQUEST_INTERVAL_MS)? {
            config.min_request_interval = Duration::from_millis(ms);
        }
        if let Some(retries) = parse_var::<u32, _>(&lookup, ENV_MAX_RETRIES)? {
            config.max_retries = retries;
        }
        if let Some(raw) = lookup(ENV_PROVIDER) {
            config.provider = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_QUOTE_CURRENCY) {
            let currency = raw.trim().to_lowercase();
            if currency.is_empty() || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ConfigError::invalid_value(ENV_QUOTE_CURRENCY, &raw));
            }
            config.quote_currency = currency;
        }

        tracing::debug!(
            cache_duration_secs = config.cache_duration.as_secs(),
            min_request_interval_ms = config.min_request_interval.as_millis() as u64,
            max_retries = config.max_retries,
            provider = ?config.provider,
            quote_currency = %config.quote_currency,
            "Loaded market data config"
        );

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::invalid_value(key, &raw)),
    }
}
