//! Time-boxed in-memory cache for upstream payloads
//!
//! Entries expire `ttl` after insertion. There is no size bound and no LRU:
//! key cardinality is bounded by the distinct tickers callers actively
//! view. A host that fans out over an unbounded ticker universe will grow
//! this map without limit until `clear` is called.

use crate::types::{History, Interval, Period, QueryKind, TickerInfo};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Cached payload; `Arc` so a hit hands back the very object stored
#[derive(Debug, Clone)]
pub enum CachedPayload {
    Info(Arc<TickerInfo>),
    History(Arc<History>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    ticker: String,
    kind: QueryKind,
}

impl CacheKey {
    fn new(ticker: &str, kind: QueryKind) -> Self {
        Self {
            ticker: ticker.to_string(),
            kind,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    payload: CachedPayload,
    inserted_at: Instant,
}

/// Process-wide TTL cache keyed by (ticker, query kind, query parameters)
pub struct DataCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl DataCache {
    /// Creates an empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the payload if it was stored less than `ttl` ago
    ///
    /// A stale entry is evicted and reported absent.
    pub async fn get(&self, ticker: &str, kind: QueryKind) -> Option<CachedPayload> {
        let key = CacheKey::new(ticker, kind);
        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                None => return None,
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                    return Some(entry.payload.clone());
                }
                Some(_) => {}
            }
        }

        // Another writer may have refreshed the entry between the locks.
        let mut entries = self.entries.write().await;
        match entries.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.payload.clone()),
            Some(_) => {
                entries.remove(&key);
                tracing::debug!(ticker, kind = %kind, "Evicted stale cache entry");
                None
            }
            None => None,
        }
    }

    /// Stores a payload stamped with the current instant, replacing any previous one
    pub async fn put(&self, ticker: &str, kind: QueryKind, payload: CachedPayload) {
        let mut entries = self.entries.write().await;
        entries.insert(
            CacheKey::new(ticker, kind),
            CacheEntry {
                payload,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn get_info(&self, ticker: &str) -> Option<Arc<TickerInfo>> {
        match self.get(ticker, QueryKind::Info).await? {
            CachedPayload::Info(info) => Some(info),
            CachedPayload::History(_) => None,
        }
    }

    pub async fn put_info(&self, ticker: &str, info: Arc<TickerInfo>) {
        self.put(ticker, QueryKind::Info, CachedPayload::Info(info))
            .await;
    }

    pub async fn get_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Option<Arc<History>> {
        match self
            .get(ticker, QueryKind::History { period, interval })
            .await?
        {
            CachedPayload::History(history) => Some(history),
            CachedPayload::Info(_) => None,
        }
    }

    pub async fn put_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
        history: Arc<History>,
    ) {
        self.put(
            ticker,
            QueryKind::History { period, interval },
            CachedPayload::History(history),
        )
        .await;
    }

    /// Removes every entry unconditionally
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        tracing::info!(removed, "Cleared market data cache");
    }

    /// Number of stored entries, stale ones included until they are read
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::bars;

    fn info(name: &str) -> Arc<TickerInfo> {
        let mut info = TickerInfo::new();
        info.insert("longName", name);
        Arc::new(info)
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_fresh_until_ttl() {
        let cache = DataCache::new(Duration::from_secs(60));
        let stored = info("Apple Inc.");
        cache.put_info("AAPL", stored.clone()).await;

        tokio::time::advance(Duration::from_millis(59_999)).await;
        let hit = cache.get_info("AAPL").await.expect("fresh entry");
        assert!(Arc::ptr_eq(&hit, &stored));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get_info("AAPL").await.is_none());
        assert!(cache.is_empty().await, "stale entry should be evicted on read");
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_restarts_ttl() {
        let cache = DataCache::new(Duration::from_secs(60));
        cache.put_info("AAPL", info("old")).await;
        tokio::time::advance(Duration::from_secs(50)).await;

        let newer = info("new");
        cache.put_info("AAPL", newer.clone()).await;
        tokio::time::advance(Duration::from_secs(30)).await;

        let hit = cache.get_info("AAPL").await.unwrap();
        assert!(Arc::ptr_eq(&hit, &newer));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_keys_include_query_parameters() {
        let cache = DataCache::new(Duration::from_secs(60));
        let daily = Arc::new(bars(&[1.0, 2.0]));
        cache
            .put_history("AAPL", Period::FiveDays, Interval::OneDay, daily.clone())
            .await;

        assert!(cache
            .get_history("AAPL", Period::FiveDays, Interval::OneDay)
            .await
            .is_some());
        assert!(cache
            .get_history("AAPL", Period::OneDay, Interval::OneMinute)
            .await
            .is_none());
        assert!(cache.get_info("AAPL").await.is_none());
        assert!(cache
            .get_history("MSFT", Period::FiveDays, Interval::OneDay)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let cache = DataCache::new(Duration::from_secs(60));
        cache.put_info("AAPL", info("Apple")).await;
        cache.put_info("TSLA", info("Tesla")).await;
        cache
            .put_history("AAPL", Period::OneMonth, Interval::OneDay, Arc::new(bars(&[1.0])))
            .await;
        assert_eq!(cache.len().await, 3);

        cache.clear().await;

        assert!(cache.get_info("AAPL").await.is_none());
        assert!(cache.get_info("TSLA").await.is_none());
        assert!(cache
            .get_history("AAPL", Period::OneMonth, Interval::OneDay)
            .await
            .is_none());
    }
}
