//! Yahoo Finance provider implementation
//!
//! Uses the public v8 chart endpoint, which needs no cookie or crumb. The
//! chart `meta` block doubles as the info mapping; the bar arrays become
//! the history series. Works for equities, ETFs, indices and crypto pairs
//! such as `BTC-USD`.

use crate::{
    constants::{REQUEST_TIMEOUT_SECS, USER_AGENT, YAHOO_CHART_API_URL},
    error::ProviderError,
    provider::MarketDataProvider,
    types::{Bar, History, Interval, Period, TickerInfo},
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Meta fields that describe the chart request rather than the instrument
const CHART_ONLY_META_FIELDS: &[&str] = &[
    "currentTradingPeriod",
    "tradingPeriods",
    "validRanges",
    "dataGranularity",
    "range",
];

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Map<String, Value>,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteArrays>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteArrays {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Yahoo Finance chart-API provider
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    /// Creates a new Yahoo Finance provider
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(YAHOO_CHART_API_URL)
    }

    /// Creates a provider pointed at a different chart endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn build_url(&self, symbol: &str, period: Period, interval: Interval) -> String {
        format!(
            "{}/{}?range={}&interval={}&includePrePost=false",
            self.base_url,
            symbol,
            period.as_str(),
            interval.as_str()
        )
    }

    /// Fetches one chart; `Ok(None)` means Yahoo does not know the symbol
    async fn fetch_chart(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Option<ChartResult>, ProviderError> {
        let url = self.build_url(symbol, period, interval);
        tracing::debug!(url = %url, "Fetching chart from Yahoo Finance");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::NetworkError(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimitExceeded);
        }

        let response_text = response.text().await.map_err(ProviderError::NetworkError)?;

        if status == StatusCode::NOT_FOUND {
            tracing::debug!(symbol, "Yahoo Finance has no chart for symbol");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::http(status.as_u16(), &response_text));
        }

        parse_chart(&response_text)
    }
}

/// Parses a chart response body into its first result
fn parse_chart(body: &str) -> Result<Option<ChartResult>, ProviderError> {
    let envelope: ChartEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        // Yahoo sometimes throttles with a plain-text page and a 200
        Err(_) if body.trim_start().starts_with("Too Many Requests")
            || body.contains("<title>Too Many Requests") =>
        {
            return Err(ProviderError::RateLimitExceeded);
        }
        Err(e) => {
            tracing::debug!(body = %truncate(body), "Unparseable Yahoo chart response");
            return Err(ProviderError::invalid(format!(
                "Failed to parse Yahoo chart response: {}",
                e
            )));
        }
    };

    if let Some(err) = envelope.chart.error {
        if err.code.eq_ignore_ascii_case("Not Found") {
            return Ok(None);
        }
        return Err(ProviderError::api(format!(
            "{}: {}",
            err.code,
            err.description.unwrap_or_default()
        )));
    }

    Ok(envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next()))
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Turns chart meta into the flat info mapping
fn meta_to_info(mut meta: Map<String, Value>) -> TickerInfo {
    for field in CHART_ONLY_META_FIELDS {
        meta.remove(*field);
    }
    if !meta.contains_key("previousClose") {
        if let Some(prev) = meta.get("chartPreviousClose").cloned() {
            meta.insert("previousClose".to_string(), prev);
        }
    }
    TickerInfo::from(meta)
}

/// Zips the parallel bar arrays, skipping bars without a close
fn chart_to_history(chart: ChartResult) -> History {
    let Some(quote) = chart.indicators.quote.into_iter().next() else {
        return History::new();
    };
    let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();

    chart
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let close = at(&quote.close, i)?;
            let timestamp = Utc.timestamp_opt(*ts, 0).single()?;
            Some(Bar {
                timestamp,
                open: at(&quote.open, i).unwrap_or(close),
                high: at(&quote.high, i).unwrap_or(close),
                low: at(&quote.low, i).unwrap_or(close),
                close,
                volume: at(&quote.volume, i).unwrap_or(0.0),
            })
        })
        .collect()
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn ticker_info(&self, symbol: &str) -> Result<TickerInfo, ProviderError> {
        let info = self
            .fetch_chart(symbol, Period::OneDay, Interval::OneDay)
            .await?
            .map(|chart| meta_to_info(chart.meta))
            .unwrap_or_default();

        tracing::debug!(symbol, fields = info.len(), "Fetched info from Yahoo Finance");
        Ok(info)
    }

    async fn ticker_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<History, ProviderError> {
        let history = self
            .fetch_chart(symbol, period, interval)
            .await?
            .map(chart_to_history)
            .unwrap_or_default();

        tracing::debug!(
            symbol,
            period = %period,
            interval = %interval,
            bars = history.len(),
            "Fetched history from Yahoo Finance"
        );
        Ok(history)
    }

    fn provider_name(&self) -> &'static str {
        "yahoo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AAPL_CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "USD",
                    "symbol": "AAPL",
                    "longName": "Apple Inc.",
                    "regularMarketPrice": 190.5,
                    "chartPreviousClose": 188.0,
                    "dataGranularity": "1d",
                    "range": "5d",
                    "validRanges": ["1d", "5d"]
                },
                "timestamp": [1700000000, 1700086400, 1700172800],
                "indicators": {
                    "quote": [{
                        "open": [187.0, null, 189.0],
                        "high": [189.0, null, 191.0],
                        "low": [186.5, null, 188.5],
                        "close": [188.0, null, 190.5],
                        "volume": [1000, null, 1200]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_build_url() {
        let provider = YahooProvider::with_base_url("http://localhost/chart").unwrap();
        assert_eq!(
            provider.build_url("BTC-USD", Period::OneMonth, Interval::OneDay),
            "http://localhost/chart/BTC-USD?range=1mo&interval=1d&includePrePost=false"
        );
    }

    #[test]
    fn test_meta_becomes_info() {
        let chart = parse_chart(AAPL_CHART).unwrap().unwrap();
        let info = meta_to_info(chart.meta);

        assert_eq!(info.get_str("longName"), Some("Apple Inc."));
        assert_eq!(info.get_f64("regularMarketPrice"), Some(190.5));
        assert_eq!(info.get_f64("previousClose"), Some(188.0));
        assert!(info.get("validRanges").is_none());
        assert!(info.has_price());
    }

    #[test]
    fn test_bars_without_close_are_skipped() {
        let chart = parse_chart(AAPL_CHART).unwrap().unwrap();
        let history = chart_to_history(chart);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].close, 188.0);
        assert_eq!(history[1].close, 190.5);
        assert_eq!(history[1].volume, 1200.0);
        assert!(history[0].timestamp < history[1].timestamp);
    }

    #[test]
    fn test_not_found_is_empty_and_other_errors_fault() {
        let not_found = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(parse_chart(not_found).unwrap().is_none());

        let bad_request = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input - interval=7m is not supported"}}}"#;
        assert!(matches!(
            parse_chart(bad_request),
            Err(ProviderError::ApiError(_))
        ));

        assert!(matches!(
            parse_chart("Too Many Requests\r\n"),
            Err(ProviderError::RateLimitExceeded)
        ));
        assert!(matches!(
            parse_chart("<html><head><title>Too Many Requests</title></head></html>"),
            Err(ProviderError::RateLimitExceeded)
        ));
    }

    #[test]
    fn test_garbage_with_429_in_it_is_not_a_rate_limit() {
        let err = parse_chart(r#"{"chart": {"result": [{"timestamp": [1700429000], "#).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
        assert!(!err.is_rate_limit());
        assert!(!err.to_string().contains("1700429000"));
    }
}
