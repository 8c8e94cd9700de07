//! Upstream and cache metrics
//!
//! Tracks upstream latency percentiles, success rate, rate-limit faults and
//! cache hit ratio for a `MarketDataClient`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for latency percentiles
const MAX_SAMPLES: usize = 100;

/// Snapshot of the collected metrics
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderMetrics {
    /// Name of the upstream provider
    pub provider_name: String,
    /// 50th percentile latency of successful upstream calls, in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful upstream calls, in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Upstream calls made
    pub total_requests: u64,
    /// Upstream calls that faulted
    pub failed_requests: u64,
    /// Faults that were rate-limit signals
    pub rate_limited_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl ProviderMetrics {
    /// Creates metrics with no data
    pub fn empty(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_requests: 0,
            failed_requests: 0,
            rate_limited_requests: 0,
            cache_hits: 0,
            cache_misses: 0,
        }
    }

    /// Fraction of lookups answered from cache, 0.0 when nothing was looked up
    pub fn cache_hit_ratio(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}

/// Outcome of one upstream call, as seen by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallResult {
    Ok,
    RateLimited,
    Failed,
}

#[derive(Debug, Clone)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

/// Collects metrics for one client
pub struct MetricsCollector {
    provider_name: String,
    /// Rolling window of latency samples
    samples: RwLock<VecDeque<LatencySample>>,
    total_requests: AtomicU64,
    failed_requests: AtomicU64,
    rate_limited_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl MetricsCollector {
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            samples: RwLock::new(VecDeque::with_capacity(MAX_SAMPLES)),
            total_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            rate_limited_requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    /// Records one upstream call with its duration and outcome
    pub async fn record_request(&self, duration: Duration, result: CallResult) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        match result {
            CallResult::Ok => {}
            CallResult::RateLimited => {
                self.failed_requests.fetch_add(1, Ordering::Relaxed);
                self.rate_limited_requests.fetch_add(1, Ordering::Relaxed);
            }
            CallResult::Failed => {
                self.failed_requests.fetch_add(1, Ordering::Relaxed);
            }
        }

        let mut samples = self.samples.write().await;
        if samples.len() >= MAX_SAMPLES {
            samples.pop_front();
        }
        samples.push_back(LatencySample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success: result == CallResult::Ok,
        });
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Computes current metrics from collected samples
    pub async fn get_metrics(&self) -> ProviderMetrics {
        let total = self.total_requests.load(Ordering::Relaxed);
        let failed = self.failed_requests.load(Ordering::Relaxed);

        let mut metrics = ProviderMetrics::empty(&self.provider_name);
        metrics.total_requests = total;
        metrics.failed_requests = failed;
        metrics.rate_limited_requests = self.rate_limited_requests.load(Ordering::Relaxed);
        metrics.cache_hits = self.cache_hits.load(Ordering::Relaxed);
        metrics.cache_misses = self.cache_misses.load(Ordering::Relaxed);

        if total > 0 {
            metrics.success_rate = (total - failed) as f64 / total as f64;
        }

        let samples = self.samples.read().await;
        let mut latencies: Vec<f64> = samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();
        latencies.sort_by(|a, b| a.total_cmp(b));

        metrics.latency_p50_ms = percentile(&latencies, 50.0);
        metrics.latency_p99_ms = percentile(&latencies, 99.0);
        metrics
    }
}

/// Nearest-rank percentile of sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let rank = (p / 100.0 * sorted_values.len() as f64).ceil() as usize;
    sorted_values[rank.clamp(1, sorted_values.len()) - 1]
}
