//! Failover provider implementation

use crate::{
    error::ProviderError,
    provider::MarketDataProvider,
    types::{History, Interval, Period, TickerInfo},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Provider that asks several providers in order until one has data
///
/// A provider answering with an empty payload does not stop the chain. If
/// no provider has data, a rate-limit fault wins so the caller backs off;
/// failing that an empty answer wins over other faults, and otherwise the
/// last fault is returned.
pub struct FailoverProvider {
    providers: Vec<Arc<dyn MarketDataProvider>>,
}

impl FailoverProvider {
    /// Creates a new failover provider with a list of providers
    ///
    /// The providers are tried in the order they are provided.
    pub fn new(providers: Vec<Arc<dyn MarketDataProvider>>) -> Self {
        Self { providers }
    }
}

/// Answers collected from providers that had no data
#[derive(Default)]
struct Misses {
    rate_limited: Option<ProviderError>,
    last_error: Option<ProviderError>,
    saw_empty: bool,
}

impl Misses {
    fn record(&mut self, err: ProviderError) {
        if err.is_rate_limit() {
            self.rate_limited = Some(err);
        } else {
            self.last_error = Some(err);
        }
    }

    fn settle<T: Default>(self) -> Result<T, ProviderError> {
        if let Some(e) = self.rate_limited {
            return Err(e);
        }
        if self.saw_empty {
            return Ok(T::default());
        }
        Err(self
            .last_error
            .unwrap_or_else(|| ProviderError::invalid("No providers configured for failover")))
    }
}

#[async_trait]
impl MarketDataProvider for FailoverProvider {
    async fn ticker_info(&self, symbol: &str) -> Result<TickerInfo, ProviderError> {
        let mut misses = Misses::default();

        for provider in &self.providers {
            match provider.ticker_info(symbol).await {
                Ok(info) if !info.is_empty() => return Ok(info),
                Ok(_) => misses.saw_empty = true,
                Err(e) => {
                    tracing::warn!(
                        provider = provider.provider_name(),
                        symbol,
                        error = %e,
                        "Provider failed to fetch info"
                    );
                    misses.record(e);
                }
            }
        }

        misses.settle()
    }

    async fn ticker_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<History, ProviderError> {
        let mut misses = Misses::default();

        for provider in &self.providers {
            match provider.ticker_history(symbol, period, interval).await {
                Ok(history) if !history.is_empty() => return Ok(history),
                Ok(_) => misses.saw_empty = true,
                Err(e) => {
                    tracing::warn!(
                        provider = provider.provider_name(),
                        symbol,
                        error = %e,
                        "Provider failed to fetch history"
                    );
                    misses.record(e);
                }
            }
        }

        misses.settle()
    }

    fn provider_name(&self) -> &'static str {
        "failover"
    }
}
