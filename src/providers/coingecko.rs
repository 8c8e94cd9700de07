//! CoinGecko price provider implementation
//!
//! Tickers are CoinGecko coin ids (`bitcoin`, `solana`, ...). Yahoo-style
//! crypto pairs of well-known coins (`BTC-USD`, `ETH-EUR`) are mapped to
//! their coin id so the provider can back up Yahoo in a failover chain;
//! equity tickers map to no coin and answer empty. Info comes from the
//! simple-price endpoint and history from `market_chart`, which only
//! reports closing prices.

use crate::{
    constants::{
        COINGECKO_API_URL, COINGECKO_SIMPLE_PRICE_ENDPOINT, COINGECKO_VS_CURRENCY,
        REQUEST_TIMEOUT_SECS, USER_AGENT,
    },
    error::ProviderError,
    provider::MarketDataProvider,
    types::{Bar, History, Interval, Period, TickerInfo},
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// CoinGecko API response for simple price queries
#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    #[serde(flatten)]
    prices: HashMap<String, HashMap<String, Option<f64>>>,
}

/// CoinGecko API response for market chart queries
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
    #[serde(default)]
    total_volumes: Vec<(f64, f64)>,
}

/// Yahoo base symbols of the coins the failover chain can price
const PAIR_BASE_COIN_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("SOL", "solana"),
    ("USDT", "tether"),
    ("USDC", "usd-coin"),
    ("BNB", "binancecoin"),
    ("XRP", "ripple"),
    ("ADA", "cardano"),
    ("DOGE", "dogecoin"),
    ("DOT", "polkadot"),
    ("AVAX", "avalanche-2"),
    ("LINK", "chainlink"),
    ("LTC", "litecoin"),
    ("TRX", "tron"),
];

/// CoinGecko price provider
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    /// Quote currency, lower-case (`usd`, `eur`, ...)
    vs_currency: String,
}

impl CoinGeckoProvider {
    /// Creates a new CoinGecko provider
    pub fn new() -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            base_url: COINGECKO_API_URL.to_string(),
            vs_currency: COINGECKO_VS_CURRENCY.to_string(),
        })
    }

    /// Quotes prices in `currency` instead of USD
    pub fn with_vs_currency(mut self, currency: &str) -> Self {
        self.vs_currency = currency.trim().to_lowercase();
        self
    }

    /// CoinGecko coin id for a ticker
    ///
    /// `BTC-USD` style pairs of known coins map through `PAIR_BASE_COIN_IDS`;
    /// anything else is taken as a coin id already.
    fn coin_id(symbol: &str) -> String {
        let symbol = symbol.trim();
        if let Some((base, _quote)) = symbol.split_once('-') {
            let base = base.to_ascii_uppercase();
            if let Some((_, id)) = PAIR_BASE_COIN_IDS.iter().find(|(b, _)| *b == base) {
                return (*id).to_string();
            }
        }
        symbol.to_lowercase()
    }

    /// Builds the CoinGecko API URL for the simple price query
    fn build_price_url(&self, id: &str) -> String {
        format!(
            "{}{}?ids={}&vs_currencies={}&include_24hr_change=true&include_market_cap=true&include_24hr_vol=true",
            self.base_url, COINGECKO_SIMPLE_PRICE_ENDPOINT, id, self.vs_currency
        )
    }

    fn build_chart_url(&self, id: &str, period: Period, interval: Interval) -> String {
        let days = period
            .approx_days()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "max".to_string());
        let mut url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.base_url, id, self.vs_currency, days
        );
        if !interval.is_intraday() {
            url.push_str("&interval=daily");
        }
        url
    }

    /// GETs a URL; `Ok(None)` means CoinGecko does not know the coin
    async fn get_text(&self, url: &str) -> Result<Option<String>, ProviderError> {
        tracing::debug!(url, "Fetching from CoinGecko");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ProviderError::NetworkError)?;

        // Check for rate limiting
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimitExceeded);
        }
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        // Check for other errors
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::http(status.as_u16(), &body));
        }

        let text = response.text().await.map_err(ProviderError::NetworkError)?;
        Ok(Some(text))
    }

    /// Parses the simple price response into an info mapping
    fn parse_price(&self, id: &str, body: &str) -> Result<TickerInfo, ProviderError> {
        let response: SimplePriceResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::invalid(format!("Failed to parse CoinGecko response: {}", e))
        })?;

        let mut info = TickerInfo::new();
        let Some(fields) = response.prices.get(id) else {
            return Ok(info);
        };
        let field = |suffix: &str| -> Option<f64> {
            let key = if suffix.is_empty() {
                self.vs_currency.clone()
            } else {
                format!("{}_{}", self.vs_currency, suffix)
            };
            fields.get(&key).copied().flatten()
        };

        let Some(price) = field("") else {
            return Ok(info);
        };
        info.insert("symbol", id);
        info.insert("currency", self.vs_currency.to_uppercase());
        info.insert("currentPrice", price);
        info.insert("regularMarketPrice", price);
        if let Some(change_pct) = field("24h_change") {
            info.insert("regularMarketChangePercent", change_pct);
            if change_pct > -100.0 {
                info.insert("previousClose", price / (1.0 + change_pct / 100.0));
            }
        }
        if let Some(cap) = field("market_cap") {
            info.insert("marketCap", cap);
        }
        if let Some(volume) = field("24h_vol") {
            info.insert("volume24Hr", volume);
        }
        Ok(info)
    }

    /// Parses the market chart response into close-only bars
    fn parse_chart(&self, body: &str) -> Result<History, ProviderError> {
        let chart: MarketChartResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::invalid(format!("Failed to parse CoinGecko market chart: {}", e))
        })?;

        let history = chart
            .prices
            .iter()
            .enumerate()
            .filter_map(|(i, (ms, price))| {
                let timestamp = Utc.timestamp_millis_opt(*ms as i64).single()?;
                let mut bar = Bar::close_only(timestamp, *price);
                bar.volume = chart.total_volumes.get(i).map(|(_, v)| *v).unwrap_or(0.0);
                Some(bar)
            })
            .collect();
        Ok(history)
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    async fn ticker_info(&self, symbol: &str) -> Result<TickerInfo, ProviderError> {
        let id = Self::coin_id(symbol);
        match self.get_text(&self.build_price_url(&id)).await? {
            Some(body) => self.parse_price(&id, &body),
            None => Ok(TickerInfo::new()),
        }
    }

    async fn ticker_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<History, ProviderError> {
        let id = Self::coin_id(symbol);
        let history = match self
            .get_text(&self.build_chart_url(&id, period, interval))
            .await?
        {
            Some(body) => self.parse_chart(&body)?,
            None => History::new(),
        };

        tracing::debug!(
            coin = %id,
            bars = history.len(),
            "Fetched market chart from CoinGecko"
        );
        Ok(history)
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let provider = CoinGeckoProvider::new().unwrap();
        assert_eq!(CoinGeckoProvider::coin_id(" Bitcoin "), "bitcoin");
        assert_eq!(CoinGeckoProvider::coin_id("BTC-USD"), "bitcoin");
        assert_eq!(CoinGeckoProvider::coin_id("eth-eur"), "ethereum");
        assert_eq!(CoinGeckoProvider::coin_id("AVAX-USD"), "avalanche-2");
        assert_eq!(CoinGeckoProvider::coin_id("AAPL"), "aapl");
        assert_eq!(CoinGeckoProvider::coin_id("BRK-B"), "brk-b");
        assert!(provider
            .build_price_url("bitcoin")
            .ends_with("/simple/price?ids=bitcoin&vs_currencies=usd&include_24hr_change=true&include_market_cap=true&include_24hr_vol=true"));
        assert!(provider
            .build_chart_url("solana", Period::FiveDays, Interval::OneDay)
            .ends_with("/coins/solana/market_chart?vs_currency=usd&days=5&interval=daily"));
        assert!(provider
            .build_chart_url("solana", Period::Max, Interval::OneHour)
            .ends_with("days=max"));
    }

    #[test]
    fn test_parse_price() {
        let provider = CoinGeckoProvider::new().unwrap();
        let body = r#"{"bitcoin":{"usd":110.0,"usd_24h_change":10.0,"usd_market_cap":1000.0,"usd_24h_vol":null}}"#;
        let info = provider.parse_price("bitcoin", body).unwrap();

        assert_eq!(info.get_f64("currentPrice"), Some(110.0));
        assert_eq!(info.get_str("symbol"), Some("bitcoin"));
        let prev = info.get_f64("previousClose").unwrap();
        assert!((prev - 100.0).abs() < 1e-9);
        assert_eq!(info.get_f64("marketCap"), Some(1000.0));
        assert!(info.get("volume24Hr").is_none());
    }

    #[test]
    fn test_parse_price_in_other_currency() {
        let provider = CoinGeckoProvider::new().unwrap().with_vs_currency("EUR");
        assert!(provider
            .build_price_url("bitcoin")
            .contains("vs_currencies=eur&"));
        let body = r#"{"bitcoin":{"eur":32000.0,"usd":35000.0}}"#;
        let info = provider.parse_price("bitcoin", body).unwrap();

        assert_eq!(info.get_f64("currentPrice"), Some(32000.0));
        assert_eq!(info.get_str("currency"), Some("EUR"));
    }

    #[test]
    fn test_unknown_coin_is_empty() {
        let provider = CoinGeckoProvider::new().unwrap();
        assert!(provider.parse_price("notacoin", "{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_chart() {
        let provider = CoinGeckoProvider::new().unwrap();
        let body = r#"{"prices":[[1700000000000,35000.5],[1700086400000,36000.0]],"market_caps":[],"total_volumes":[[1700000000000,12.5]]}"#;
        let history = provider.parse_chart(body).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].close, 35000.5);
        assert_eq!(history[0].volume, 12.5);
        assert_eq!(history[1].volume, 0.0);
        assert_eq!(history[1].open, 36000.0);
    }
}
