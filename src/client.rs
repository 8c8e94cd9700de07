//! Market data client: cached, throttled and retrying access to the upstream
//!
//! `MarketDataClient` is the one context object a process builds and hands
//! to every caller (dashboard requests, portfolio valuation, watchlist
//! monitor). Clones share the same cache, rate limiter and metrics.

use crate::{
    cache::DataCache,
    config::{MarketDataConfig, ProviderKind},
    error::ProviderError,
    metrics::{CallResult, MetricsCollector, ProviderMetrics},
    provider::MarketDataProvider,
    providers::{CoinGeckoProvider, FailoverProvider, YahooProvider},
    rate_limiter::RateLimiter,
    retry::{Attempt, RetryOutcome, RetryPolicy},
    types::{last_two_closes, ComponentHealth, HealthStatus, History, Interval, Period, TickerInfo},
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

/// Success rate at or above which the upstream counts as healthy
const HEALTHY_SUCCESS_RATE: f64 = 0.9;

/// Success rate below which the upstream counts as unhealthy
const UNHEALTHY_SUCCESS_RATE: f64 = 0.5;

/// Cached, rate-limited, retrying market data access
///
/// # Example
/// ```no_run
/// use tickerline::{Interval, MarketDataClient, MarketDataConfig, Period};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = MarketDataClient::new(MarketDataConfig::from_env()?)?;
///
/// if let Some(info) = client.fetch_info("AAPL").await {
///     println!("AAPL: {:?}", info.price());
/// }
/// let history = client
///     .fetch_history("AAPL", Period::OneMonth, Interval::OneDay)
///     .await
///     .unwrap_or_default();
/// println!("{} daily bars", history.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MarketDataClient {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<DataCache>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
    metrics: Arc<MetricsCollector>,
}

impl MarketDataClient {
    /// Creates a client talking to the provider named in `config`
    pub fn new(config: MarketDataConfig) -> Result<Self, ProviderError> {
        let provider = build_provider(&config)?;
        Ok(Self::with_provider(provider, config))
    }

    /// Creates a client with a custom provider
    pub fn with_provider(provider: Arc<dyn MarketDataProvider>, config: MarketDataConfig) -> Self {
        let metrics = Arc::new(MetricsCollector::new(provider.provider_name()));

        Self {
            provider,
            cache: Arc::new(DataCache::new(config.cache_duration)),
            limiter: Arc::new(RateLimiter::new(config.min_request_interval)),
            policy: RetryPolicy::from_config(&config),
            metrics,
        }
    }

    /// Returns the name of the current provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Info mapping for a ticker, or `None` when it is unavailable right now
    ///
    /// Served from cache when fresh. Otherwise the upstream is asked with
    /// backoff on faults; a mapping without any price is repaired from
    /// intraday history, and an empty mapping is replaced by a minimal
    /// record built from daily history. `None` means "try later", never a
    /// crash condition.
    pub async fn fetch_info(&self, ticker: &str) -> Option<Arc<TickerInfo>> {
        if let Some(info) = self.cache.get_info(ticker).await {
            self.metrics.record_cache_hit();
            tracing::debug!(ticker, "Info served from cache");
            return Some(info);
        }
        self.metrics.record_cache_miss();

        let label = format!("{ticker} info");
        match self.policy.run(&label, |_| self.attempt_info(ticker)).await {
            RetryOutcome::Success(info) => {
                let info = Arc::new(info);
                self.cache.put_info(ticker, info.clone()).await;
                Some(info)
            }
            RetryOutcome::Empty => {
                tracing::warn!(ticker, "No info available from upstream or history fallback");
                None
            }
            RetryOutcome::Exhausted => None,
        }
    }

    /// History series for a ticker
    ///
    /// `Some(empty)` when the upstream has no rows (not cached, not
    /// retried); `None` when every attempt faulted.
    pub async fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Option<Arc<History>> {
        if let Some(history) = self.cache.get_history(ticker, period, interval).await {
            self.metrics.record_cache_hit();
            tracing::debug!(ticker, period = %period, interval = %interval, "History served from cache");
            return Some(history);
        }
        self.metrics.record_cache_miss();

        let label = format!("{ticker} history({period}, {interval})");
        let outcome = self
            .policy
            .run(&label, |_| async move {
                match self.call_history(ticker, period, interval).await {
                    Ok(history) if history.is_empty() => Attempt::Empty,
                    Ok(history) => Attempt::Success(history),
                    Err(e) => Attempt::from_error(&e),
                }
            })
            .await;

        match outcome {
            RetryOutcome::Success(history) => {
                let history = Arc::new(history);
                self.cache
                    .put_history(ticker, period, interval, history.clone())
                    .await;
                Some(history)
            }
            RetryOutcome::Empty => {
                tracing::warn!(ticker, period = %period, interval = %interval, "Empty history");
                Some(Arc::new(History::new()))
            }
            RetryOutcome::Exhausted => None,
        }
    }

    /// Drops every cached payload so the next fetches go upstream
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Number of cached payloads, stale ones included until read
    pub async fn cached_entries(&self) -> usize {
        self.cache.len().await
    }

    /// Upstream latency, success rate and cache counters
    pub async fn provider_metrics(&self) -> ProviderMetrics {
        self.metrics.get_metrics().await
    }

    /// One info attempt, including both history fallbacks
    async fn attempt_info(&self, ticker: &str) -> Attempt<TickerInfo> {
        let mut info = match self.call_info(ticker).await {
            Ok(info) => info,
            Err(e) => return Attempt::from_error(&e),
        };

        if info.is_empty() {
            tracing::warn!(ticker, "Empty info, trying history fallback");
            return match self.info_from_history(ticker).await {
                Some(fallback) => Attempt::Success(fallback),
                None => Attempt::Empty,
            };
        }

        if !info.has_price() {
            self.fill_price_from_history(ticker, &mut info).await;
        }
        if !info.has_price() && !info.has_identity() {
            tracing::warn!(ticker, "Info has no price and no name, returning it anyway");
        }
        Attempt::Success(info)
    }

    /// Adds price fields from intraday bars; never touches existing fields
    async fn fill_price_from_history(&self, ticker: &str, info: &mut TickerInfo) {
        let history = match self
            .call_history(ticker, Period::OneDay, Interval::OneMinute)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                tracing::debug!(ticker, error = %e, "Could not get price from history");
                return;
            }
        };

        if let Some((latest, previous)) = last_two_closes(&history) {
            info.insert("currentPrice", latest);
            info.insert("regularMarketPrice", latest);
            if let Some(previous) = previous {
                info.insert("previousClose", previous);
            }
        }
    }

    /// Minimal info record from daily bars, or `None` when there are none
    async fn info_from_history(&self, ticker: &str) -> Option<TickerInfo> {
        let history = match self
            .call_history(ticker, Period::FiveDays, Interval::OneDay)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                tracing::debug!(ticker, error = %e, "History fallback also failed");
                return None;
            }
        };

        let (latest, previous) = last_two_closes(&history)?;
        let mut info = TickerInfo::new();
        info.insert("currentPrice", latest);
        info.insert("regularMarketPrice", latest);
        info.insert("previousClose", previous.unwrap_or(latest));
        info.insert("symbol", ticker);
        info.insert("longName", ticker);
        Some(info)
    }

    /// Throttled, measured upstream info call
    async fn call_info(&self, ticker: &str) -> Result<TickerInfo, ProviderError> {
        self.limiter.acquire().await;
        let start = Instant::now();
        let result = self.provider.ticker_info(ticker).await;
        self.record(start, &result).await;
        result
    }

    /// Throttled, measured upstream history call
    async fn call_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<History, ProviderError> {
        self.limiter.acquire().await;
        let start = Instant::now();
        let result = self.provider.ticker_history(ticker, period, interval).await;
        self.record(start, &result).await;
        result
    }

    async fn record<T>(&self, start: Instant, result: &Result<T, ProviderError>) {
        let call = match result {
            Ok(_) => CallResult::Ok,
            Err(e) if e.is_rate_limit() => CallResult::RateLimited,
            Err(_) => CallResult::Failed,
        };
        self.metrics.record_request(start.elapsed(), call).await;
    }

    /// Perform a health check on the client
    ///
    /// # Returns
    /// ComponentHealth derived from the upstream success rate
    pub async fn health_check(&self) -> ComponentHealth {
        let metrics = self.provider_metrics().await;
        let mut details = HashMap::new();

        details.insert(
            "provider_name".to_string(),
            serde_json::json!(self.provider_name()),
        );
        details.insert(
            "cached_entries".to_string(),
            serde_json::json!(self.cached_entries().await),
        );
        details.insert(
            "total_requests".to_string(),
            serde_json::json!(metrics.total_requests),
        );
        details.insert(
            "rate_limited_requests".to_string(),
            serde_json::json!(metrics.rate_limited_requests),
        );
        details.insert(
            "success_rate".to_string(),
            serde_json::json!(metrics.success_rate),
        );
        details.insert(
            "cache_hit_ratio".to_string(),
            serde_json::json!(metrics.cache_hit_ratio()),
        );

        let status = if metrics.success_rate >= HEALTHY_SUCCESS_RATE {
            HealthStatus::Healthy
        } else if metrics.success_rate >= UNHEALTHY_SUCCESS_RATE {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        };

        let message = match status {
            HealthStatus::Healthy if metrics.total_requests == 0 => {
                "No upstream requests made yet".to_string()
            }
            HealthStatus::Healthy => "Upstream is answering normally".to_string(),
            HealthStatus::Degraded | HealthStatus::Unhealthy => format!(
                "{} of {} upstream requests failed ({} rate limited)",
                metrics.failed_requests, metrics.total_requests, metrics.rate_limited_requests
            ),
        };

        ComponentHealth {
            name: "market_data_client".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: chrono::Utc::now(),
        }
    }
}

/// Builds the upstream named by `config.provider`
pub fn build_provider(
    config: &MarketDataConfig,
) -> Result<Arc<dyn MarketDataProvider>, ProviderError> {
    let coingecko = || -> Result<CoinGeckoProvider, ProviderError> {
        Ok(CoinGeckoProvider::new()?.with_vs_currency(&config.quote_currency))
    };
    let provider: Arc<dyn MarketDataProvider> = match config.provider {
        ProviderKind::Yahoo => Arc::new(YahooProvider::new()?),
        ProviderKind::CoinGecko => Arc::new(coingecko()?),
        // Yahoo (primary) -> CoinGecko (backup, crypto pairs only)
        ProviderKind::Failover => Arc::new(FailoverProvider::new(vec![
            Arc::new(YahooProvider::new()?),
            Arc::new(coingecko()?),
        ])),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{bars, MockCall, MockFault, MockProvider};
    use std::time::Duration;

    fn client(mock: &Arc<MockProvider>) -> MarketDataClient {
        MarketDataClient::with_provider(mock.clone(), MarketDataConfig::default())
    }

    fn apple() -> TickerInfo {
        let mut info = TickerInfo::new();
        info.insert("symbol", "AAPL");
        info.insert("longName", "Apple Inc.");
        info.insert("currentPrice", 190.5);
        info
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_fetch_within_ttl_is_cached_object() {
        let mock = Arc::new(MockProvider::new());
        mock.push_info("AAPL", Ok(apple()));
        let client = client(&mock);

        let first = client.fetch_info("AAPL").await.unwrap();
        let grant = client.limiter.last_grant().await;

        tokio::time::advance(Duration::from_secs(10)).await;
        let second = client.fetch_info("AAPL").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(mock.call_count(), 1);
        assert_eq!(client.limiter.last_grant().await, grant);

        let metrics = client.provider_metrics().await;
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(metrics.cache_misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_info_refetched_after_ttl() {
        let mock = Arc::new(MockProvider::new());
        mock.push_info("AAPL", Ok(apple()));
        let client = client(&mock);

        client.fetch_info("AAPL").await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        client.fetch_info("AAPL").await.unwrap();

        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cache_forces_refetch() {
        let mock = Arc::new(MockProvider::new());
        mock.push_info("AAPL", Ok(apple()));
        mock.push_history("AAPL", Period::FiveDays, Interval::OneDay, Ok(bars(&[1.0, 2.0])));
        let client = client(&mock);

        client.fetch_info("AAPL").await.unwrap();
        client
            .fetch_history("AAPL", Period::FiveDays, Interval::OneDay)
            .await
            .unwrap();
        assert_eq!(client.cached_entries().await, 2);

        client.clear_cache().await;
        assert_eq!(client.cached_entries().await, 0);

        client.fetch_info("AAPL").await.unwrap();
        client
            .fetch_history("AAPL", Period::FiveDays, Interval::OneDay)
            .await
            .unwrap();
        assert_eq!(mock.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_named_info_without_price_is_kept_untouched() {
        let mock = Arc::new(MockProvider::new());
        let mut info = TickerInfo::new();
        info.insert("longName", "Obscure Holdings");
        info.insert("sector", "Industrials");
        mock.push_info("OBSC", Ok(info.clone()));
        mock.push_history(
            "OBSC",
            Period::OneDay,
            Interval::OneMinute,
            Err(MockFault::Transient("no intraday data".into())),
        );
        let client = client(&mock);

        let fetched = client.fetch_info("OBSC").await.unwrap();

        assert_eq!(*fetched, info);
        assert_eq!(
            mock.calls(),
            vec![
                MockCall::Info("OBSC".into()),
                MockCall::History("OBSC".into(), Period::OneDay, Interval::OneMinute),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_price_filled_from_intraday_history() {
        let mock = Arc::new(MockProvider::new());
        let mut info = TickerInfo::new();
        info.insert("shortName", "Tesla");
        info.insert("marketCap", 1_000);
        mock.push_info("TSLA", Ok(info));
        mock.push_history(
            "TSLA",
            Period::OneDay,
            Interval::OneMinute,
            Ok(bars(&[200.0, 201.0, 202.5])),
        );
        let client = client(&mock);

        let fetched = client.fetch_info("TSLA").await.unwrap();

        assert_eq!(fetched.get_f64("currentPrice"), Some(202.5));
        assert_eq!(fetched.get_f64("regularMarketPrice"), Some(202.5));
        assert_eq!(fetched.get_f64("previousClose"), Some(201.0));
        assert_eq!(fetched.get_str("shortName"), Some("Tesla"));
        assert_eq!(fetched.get_f64("marketCap"), Some(1000.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_info_without_price_or_name_is_still_returned() {
        let mock = Arc::new(MockProvider::new());
        let mut info = TickerInfo::new();
        info.insert("exchange", "NMS");
        mock.push_info("XYZ", Ok(info.clone()));
        mock.push_history("XYZ", Period::OneDay, Interval::OneMinute, Ok(vec![]));
        let client = client(&mock);

        assert_eq!(*client.fetch_info("XYZ").await.unwrap(), info);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_info_synthesized_from_daily_history() {
        let mock = Arc::new(MockProvider::new());
        mock.push_info("BTC-USD", Ok(TickerInfo::new()));
        mock.push_history(
            "BTC-USD",
            Period::FiveDays,
            Interval::OneDay,
            Ok(bars(&[30_000.0, 31_000.0])),
        );
        let client = client(&mock);

        let fetched = client.fetch_info("BTC-USD").await.unwrap();

        assert_eq!(fetched.len(), 5);
        assert_eq!(fetched.get_f64("currentPrice"), Some(31_000.0));
        assert_eq!(fetched.get_f64("regularMarketPrice"), Some(31_000.0));
        assert_eq!(fetched.get_f64("previousClose"), Some(30_000.0));
        assert_eq!(fetched.get_str("symbol"), Some("BTC-USD"));
        assert_eq!(fetched.get_str("longName"), Some("BTC-USD"));
        assert_eq!(client.cached_entries().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_bar_fallback_uses_latest_as_previous() {
        let mock = Arc::new(MockProvider::new());
        mock.push_info("NEW", Ok(TickerInfo::new()));
        mock.push_history("NEW", Period::FiveDays, Interval::OneDay, Ok(bars(&[12.0])));
        let client = client(&mock);

        let fetched = client.fetch_info("NEW").await.unwrap();
        assert_eq!(fetched.get_f64("previousClose"), Some(12.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_info_and_empty_history_is_absent_without_retry() {
        let mock = Arc::new(MockProvider::new());
        mock.push_info("GONE", Ok(TickerInfo::new()));
        mock.push_history("GONE", Period::FiveDays, Interval::OneDay, Ok(vec![]));
        let client = client(&mock);
        let start = Instant::now();

        assert!(client.fetch_info("GONE").await.is_none());
        assert_eq!(mock.call_count(), 2);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(client.cached_entries().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_info_backs_off_2_4_8_then_absent() {
        let mock = Arc::new(MockProvider::new());
        mock.push_info("AAPL", Err(MockFault::RateLimited));
        let client = client(&mock);
        let start = Instant::now();

        assert!(client.fetch_info("AAPL").await.is_none());

        let offsets: Vec<Duration> = mock
            .call_instants()
            .into_iter()
            .map(|t| t - start)
            .collect();
        assert_eq!(
            offsets,
            vec![
                Duration::ZERO,
                Duration::from_secs(2),
                Duration::from_secs(6),
                Duration::from_secs(14),
            ]
        );
        assert_eq!(start.elapsed(), Duration::from_secs(14));

        let metrics = client.provider_metrics().await;
        assert_eq!(metrics.rate_limited_requests, 4);
        assert_eq!(client.health_check().await.status, HealthStatus::Unhealthy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_recovers_and_caches() {
        let mock = Arc::new(MockProvider::new());
        mock.push_info("AAPL", Err(MockFault::RateLimited));
        mock.push_info("AAPL", Err(MockFault::RateLimited));
        mock.push_info("AAPL", Ok(apple()));
        let client = client(&mock);
        let start = Instant::now();

        let info = client.fetch_info("AAPL").await.unwrap();

        assert_eq!(info.get_f64("currentPrice"), Some(190.5));
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        assert_eq!(client.cached_entries().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_faults_retry_after_one_second() {
        let mock = Arc::new(MockProvider::new());
        mock.push_history(
            "AAPL",
            Period::OneMonth,
            Interval::OneDay,
            Err(MockFault::Transient("connection reset".into())),
        );
        let client = client(&mock);
        let start = Instant::now();

        let history = client
            .fetch_history("AAPL", Period::OneMonth, Interval::OneDay)
            .await;

        assert!(history.is_none());
        assert_eq!(mock.call_count(), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_mentioning_429_take_the_transient_path() {
        let mock = Arc::new(MockProvider::new());
        mock.push_history(
            "AAPL",
            Period::OneMonth,
            Interval::OneDay,
            Err(MockFault::Transient("HTTP 500: {\"t\":[1700429000]}".into())),
        );
        mock.push_history(
            "MSFT",
            Period::OneMonth,
            Interval::OneDay,
            Err(MockFault::Http(502, "{\"close\":[142.9,429.0]}".into())),
        );
        let client = client(&mock);

        for ticker in ["AAPL", "MSFT"] {
            // clear of the limiter spacing left by the previous ticker
            tokio::time::advance(Duration::from_secs(1)).await;
            let start = Instant::now();
            let history = client
                .fetch_history(ticker, Period::OneMonth, Interval::OneDay)
                .await;
            assert!(history.is_none());
            assert_eq!(start.elapsed(), Duration::from_secs(3));
        }
        assert_eq!(mock.call_count(), 8);

        let metrics = client.provider_metrics().await;
        assert_eq!(metrics.rate_limited_requests, 0);
        assert_eq!(metrics.failed_requests, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_history_returned_immediately_and_not_cached() {
        let mock = Arc::new(MockProvider::new());
        mock.push_history("AAPL", Period::OneDay, Interval::FiveMinutes, Ok(vec![]));
        let client = client(&mock);

        let history = client
            .fetch_history("AAPL", Period::OneDay, Interval::FiveMinutes)
            .await
            .unwrap();

        assert!(history.is_empty());
        assert_eq!(mock.call_count(), 1);
        assert_eq!(client.cached_entries().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_cached_per_query() {
        let mock = Arc::new(MockProvider::new());
        mock.push_history("AAPL", Period::FiveDays, Interval::OneDay, Ok(bars(&[1.0, 2.0])));
        mock.push_history(
            "AAPL",
            Period::OneMonth,
            Interval::OneDay,
            Ok(bars(&[1.0, 2.0, 3.0])),
        );
        let client = client(&mock);

        let five = client
            .fetch_history("AAPL", Period::FiveDays, Interval::OneDay)
            .await
            .unwrap();
        let month = client
            .fetch_history("AAPL", Period::OneMonth, Interval::OneDay)
            .await
            .unwrap();
        let five_again = client
            .fetch_history("AAPL", Period::FiveDays, Interval::OneDay)
            .await
            .unwrap();

        assert_eq!(five.len(), 2);
        assert_eq!(month.len(), 3);
        assert!(Arc::ptr_eq(&five, &five_again));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_global_spacing() {
        let mock = Arc::new(MockProvider::new());
        let tickers = ["AAPL", "MSFT", "TSLA", "NVDA", "BTC-USD"];
        for t in tickers {
            mock.push_history(t, Period::FiveDays, Interval::OneDay, Ok(bars(&[1.0])));
        }
        let client = client(&mock);

        let handles: Vec<_> = tickers
            .iter()
            .map(|t| {
                let client = client.clone();
                let t = t.to_string();
                tokio::spawn(async move {
                    client
                        .fetch_history(&t, Period::FiveDays, Interval::OneDay)
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }

        let mut instants = mock.call_instants();
        instants.sort();
        assert_eq!(instants.len(), tickers.len());
        for pair in instants.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(500));
        }
    }

    #[tokio::test]
    async fn test_health_check_before_any_request() {
        let mock = Arc::new(MockProvider::new());
        let health = client(&mock).health_check().await;

        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.details["provider_name"], serde_json::json!("mock"));
        assert_eq!(
            health.message.as_deref(),
            Some("No upstream requests made yet")
        );
    }
}
