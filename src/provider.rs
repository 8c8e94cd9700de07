//! Provider abstraction for the upstream market data source

use crate::{
    error::ProviderError,
    types::{History, Interval, Period, TickerInfo},
};
use async_trait::async_trait;

/// Upstream market data capability
///
/// Implementations talk to one external source (Yahoo Finance, CoinGecko,
/// ...). They make exactly one outbound call per method invocation and do
/// no caching, throttling or retrying of their own; `MarketDataClient`
/// layers those on top.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches the flat info mapping for a ticker
    ///
    /// An empty mapping is a valid answer meaning "the upstream knows
    /// nothing useful", distinct from a fault.
    async fn ticker_info(&self, symbol: &str) -> Result<TickerInfo, ProviderError>;

    /// Fetches a time-ordered history series for a ticker
    ///
    /// An empty series is a valid answer, distinct from a fault.
    async fn ticker_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<History, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}
