//! Technical indicators over a history series
//!
//! Pure computation: simple moving averages and the relative strength index
//! with Wilder smoothing. An empty or malformed series yields no rows.

use crate::client::MarketDataClient;
use crate::types::{Bar, Interval, Period};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const SMA_SHORT_WINDOW: usize = 20;
pub const SMA_LONG_WINDOW: usize = 50;
pub const RSI_WINDOW: usize = 14;

/// One bar with its indicator values; `None` until enough bars exist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub rsi_14: Option<f64>,
}

/// Simple moving average aligned with `values`
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        out.push((i + 1 >= window).then(|| sum / window as f64));
    }
    out
}

/// Relative strength index aligned with `values`, Wilder smoothing
///
/// The first value appears at index `window`, once `window` price changes
/// are known. A flat series reads 50.
pub fn rsi(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() <= window {
        return out;
    }

    let change = |i: usize| values[i] - values[i - 1];
    let (mut avg_gain, mut avg_loss) = (1..=window).fold((0.0, 0.0), |(g, l), i| {
        let d = change(i);
        (g + d.max(0.0), l + (-d).max(0.0))
    });
    avg_gain /= window as f64;
    avg_loss /= window as f64;
    out[window] = Some(rsi_value(avg_gain, avg_loss));

    let n = window as f64;
    for i in window + 1..values.len() {
        let d = change(i);
        avg_gain = (avg_gain * (n - 1.0) + d.max(0.0)) / n;
        avg_loss = (avg_loss * (n - 1.0) + (-d).max(0.0)) / n;
        out[i] = Some(rsi_value(avg_gain, avg_loss));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// SMA-20, SMA-50 and RSI-14 for every bar
pub fn compute_indicators(history: &[Bar]) -> Vec<IndicatorRow> {
    if history.iter().any(|b| !b.close.is_finite()) {
        tracing::warn!(bars = history.len(), "History has non-finite closes, skipping indicators");
        return Vec::new();
    }

    let closes: Vec<f64> = history.iter().map(|b| b.close).collect();
    let sma_20 = sma(&closes, SMA_SHORT_WINDOW);
    let sma_50 = sma(&closes, SMA_LONG_WINDOW);
    let rsi_14 = rsi(&closes, RSI_WINDOW);

    history
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorRow {
            timestamp: bar.timestamp,
            close: bar.close,
            sma_20: sma_20[i],
            sma_50: sma_50[i],
            rsi_14: rsi_14[i],
        })
        .collect()
}

/// Fetches history through the client and adds indicators
///
/// `None` when the history is unavailable; an empty vector when the
/// upstream has no rows.
pub async fn historical_indicators(
    client: &MarketDataClient,
    ticker: &str,
    period: Period,
    interval: Interval,
) -> Option<Vec<IndicatorRow>> {
    let history = client.fetch_history(ticker, period, interval).await?;
    Some(compute_indicators(&history))
}
