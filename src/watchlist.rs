//! Per-chat watchlists and the background price monitor
//!
//! The chat transport is not part of this crate. A bot layer forwards
//! `/watch_stock`, `/watch_crypto` and `/list` commands to `Watchlists` and
//! relays the `PriceAlert`s the monitor broadcasts.

use crate::client::MarketDataClient;
use crate::constants::{MONITOR_FIRST_DELAY_SECS, MONITOR_INTERVAL_SECS};
use crate::error::ParseError;
use crate::types::{last_two_closes, Interval, Period};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Chat (or user) the watchlist belongs to
pub type ChatId = i64;

/// Capacity of the alert broadcast channel
const ALERT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Stock,
    Crypto,
}

/// Symbols one chat is watching
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchlist {
    /// Upper-cased ticker symbols
    pub stocks: Vec<String>,
    /// Lower-cased CoinGecko coin ids
    pub crypto: Vec<String>,
}

impl Watchlist {
    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty() && self.crypto.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchResult {
    Added,
    AlreadyWatching,
}

/// In-memory watchlists for every chat
#[derive(Default)]
pub struct Watchlists {
    lists: RwLock<HashMap<ChatId, Watchlist>>,
}

impl Watchlists {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn watch_stock(&self, chat: ChatId, symbol: &str) -> Result<WatchResult, ParseError> {
        let symbol = symbol.trim().to_uppercase();
        self.watch(chat, AssetClass::Stock, symbol).await
    }

    pub async fn watch_crypto(&self, chat: ChatId, coin: &str) -> Result<WatchResult, ParseError> {
        let coin = coin.trim().to_lowercase();
        self.watch(chat, AssetClass::Crypto, coin).await
    }

    async fn watch(
        &self,
        chat: ChatId,
        class: AssetClass,
        symbol: String,
    ) -> Result<WatchResult, ParseError> {
        if symbol.is_empty() {
            return Err(ParseError::EmptySymbol);
        }

        let mut lists = self.lists.write().await;
        let list = lists.entry(chat).or_default();
        let symbols = match class {
            AssetClass::Stock => &mut list.stocks,
            AssetClass::Crypto => &mut list.crypto,
        };

        if symbols.contains(&symbol) {
            return Ok(WatchResult::AlreadyWatching);
        }
        tracing::info!(chat, symbol = %symbol, class = ?class, "Added to watchlist");
        symbols.push(symbol);
        Ok(WatchResult::Added)
    }

    /// Watchlist of a chat; empty when it never watched anything
    pub async fn list(&self, chat: ChatId) -> Watchlist {
        self.lists
            .read()
            .await
            .get(&chat)
            .cloned()
            .unwrap_or_default()
    }

    /// Chat-ready listing of a watchlist
    pub async fn render(&self, chat: ChatId) -> String {
        let list = self.list(chat).await;
        let mut msg = String::from("Your watchlist:\n");
        if list.is_empty() {
            msg.push_str("—Empty—");
            return msg;
        }
        let lines: Vec<String> = list
            .stocks
            .iter()
            .map(|s| format!("📈 {s}"))
            .chain(list.crypto.iter().map(|c| format!("💱 {c}")))
            .collect();
        msg.push_str(&lines.join("\n"));
        msg
    }

    /// Copy of every non-empty watchlist
    pub async fn snapshot(&self) -> Vec<(ChatId, Watchlist)> {
        self.lists
            .read()
            .await
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(chat, list)| (*chat, list.clone()))
            .collect()
    }
}

/// Latest price for one watched symbol, addressed to one chat
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAlert {
    pub chat: ChatId,
    pub symbol: String,
    pub class: AssetClass,
    pub price: f64,
    /// ISO code of the quote currency, when the source reports one
    pub currency: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl PriceAlert {
    fn currency_prefix(&self) -> String {
        match self.currency.as_deref().map(str::to_ascii_uppercase).as_deref() {
            None => String::new(),
            Some("USD") => "$".to_string(),
            Some("EUR") => "€".to_string(),
            Some("GBP") => "£".to_string(),
            Some("JPY") => "¥".to_string(),
            Some(code) => format!("{code} "),
        }
    }
}

impl fmt::Display for PriceAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.currency_prefix();
        match self.class {
            AssetClass::Stock => write!(f, "📈 {}: {}{:.2}", self.symbol, prefix, self.price),
            AssetClass::Crypto => {
                let mut chars = self.symbol.chars();
                let name: String = chars
                    .next()
                    .map(|c| c.to_uppercase().chain(chars).collect())
                    .unwrap_or_default();
                write!(f, "💱 {}: {}{:.2}", name, prefix, self.price)
            }
        }
    }
}

/// A price with the currency it is quoted in
#[derive(Debug, Clone)]
struct Quote {
    price: f64,
    currency: Option<String>,
}

/// Background task that periodically prices every watched symbol
///
/// The task runs until `stop` is called or the monitor is dropped.
pub struct PriceMonitor {
    sender: broadcast::Sender<PriceAlert>,
    handle: JoinHandle<()>,
}

impl PriceMonitor {
    /// Starts the monitor
    ///
    /// Stocks are priced through `stocks` (last close of today's 1-minute
    /// bars), crypto through `crypto` (`currentPrice` of the info record).
    /// The first pass runs after `first_delay`, then every `interval`.
    pub fn spawn(
        stocks: MarketDataClient,
        crypto: MarketDataClient,
        watchlists: Arc<Watchlists>,
        interval: Duration,
        first_delay: Duration,
    ) -> Self {
        let (sender, _) = broadcast::channel(ALERT_CHANNEL_CAPACITY);
        let tx = sender.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(
                interval_secs = interval.as_secs(),
                "Starting watchlist monitor background task"
            );
            sleep(first_delay).await;

            loop {
                let sent = run_monitor_pass(&stocks, &crypto, &watchlists, &tx).await;
                tracing::debug!(alerts = sent, "Watchlist monitor pass complete");
                sleep(interval).await;
            }
        });

        Self { sender, handle }
    }

    /// Starts the monitor with the default one-minute cadence
    pub fn spawn_default(
        stocks: MarketDataClient,
        crypto: MarketDataClient,
        watchlists: Arc<Watchlists>,
    ) -> Self {
        Self::spawn(
            stocks,
            crypto,
            watchlists,
            Duration::from_secs(MONITOR_INTERVAL_SECS),
            Duration::from_secs(MONITOR_FIRST_DELAY_SECS),
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PriceAlert> {
        self.sender.subscribe()
    }

    /// Stops the background task
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for PriceMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Prices every watched symbol once and broadcasts the alerts
///
/// Symbols without a price are skipped. Returns the number of alerts
/// produced, whether or not anyone was subscribed.
pub async fn run_monitor_pass(
    stocks: &MarketDataClient,
    crypto: &MarketDataClient,
    watchlists: &Watchlists,
    tx: &broadcast::Sender<PriceAlert>,
) -> usize {
    let mut quotes: HashMap<(AssetClass, String), Option<Quote>> = HashMap::new();
    let mut sent = 0;

    for (chat, list) in watchlists.snapshot().await {
        let watched = list
            .stocks
            .into_iter()
            .map(|s| (AssetClass::Stock, s))
            .chain(list.crypto.into_iter().map(|c| (AssetClass::Crypto, c)));

        for (class, symbol) in watched {
            let key = (class, symbol.clone());
            let quote = match quotes.get(&key) {
                Some(quote) => quote.clone(),
                None => {
                    let quote = match class {
                        AssetClass::Stock => latest_stock_quote(stocks, &symbol).await,
                        AssetClass::Crypto => latest_crypto_quote(crypto, &symbol).await,
                    };
                    quotes.insert(key, quote.clone());
                    quote
                }
            };

            let Some(Quote { price, currency }) = quote else {
                tracing::debug!(symbol = %symbol, "No price for watched symbol, skipping");
                continue;
            };

            let alert = PriceAlert {
                chat,
                symbol,
                class,
                price,
                currency,
                observed_at: Utc::now(),
            };
            if tx.send(alert).is_err() {
                tracing::debug!(chat, "No alert subscribers");
            }
            sent += 1;
        }
    }

    sent
}

/// Last close of today's 1-minute bars; history carries no currency
async fn latest_stock_quote(client: &MarketDataClient, symbol: &str) -> Option<Quote> {
    let history = client
        .fetch_history(symbol, Period::OneDay, Interval::OneMinute)
        .await?;
    last_two_closes(&history).map(|(latest, _)| Quote {
        price: latest,
        currency: None,
    })
}

/// `currentPrice` in whatever currency the crypto client quotes
async fn latest_crypto_quote(client: &MarketDataClient, coin: &str) -> Option<Quote> {
    let info = client.fetch_info(coin).await?;
    Some(Quote {
        price: info.get_f64("currentPrice")?,
        currency: info.get_str("currency").map(str::to_string),
    })
}
