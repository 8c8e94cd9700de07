//! Portfolio valuation on top of the market data client

use crate::client::MarketDataClient;
use crate::error::ParseError;
use crate::types::{last_two_closes, Interval, Period};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

/// One position as entered by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub quantity: f64,
    /// Average cost per unit, when known
    pub buy_price: Option<f64>,
}

impl Holding {
    pub fn new(ticker: &str, quantity: f64, buy_price: Option<f64>) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            quantity,
            buy_price,
        }
    }
}

/// Parses one `TICKER=QTY[@PRICE]` entry
pub fn parse_holding(entry: &str) -> Result<Holding, ParseError> {
    let invalid = |reason: &str| ParseError::InvalidHolding {
        entry: entry.to_string(),
        reason: reason.to_string(),
    };

    let (ticker, rest) = entry.split_once('=').ok_or_else(|| invalid("missing '='"))?;
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(invalid("empty ticker"));
    }

    let (qty, price) = match rest.split_once('@') {
        Some((qty, price)) => (qty, Some(price)),
        None => (rest, None),
    };
    let quantity = qty
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid("quantity is not a number"))?;
    let buy_price = price
        .map(|p| p.trim().parse::<f64>())
        .transpose()
        .map_err(|_| invalid("price is not a number"))?;

    Ok(Holding::new(ticker, quantity, buy_price))
}

/// Parses `AAPL=10@150, btc-usd=0.5`; malformed entries are skipped
pub fn parse_holdings(input: &str) -> Vec<Holding> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match parse_holding(entry) {
            Ok(holding) => Some(holding),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping holding");
                None
            }
        })
        .collect()
}

/// Merges holdings per ticker: quantities summed, average costs averaged
///
/// Order follows first appearance. Entries without a buy price count as
/// zero cost.
pub fn aggregate_holdings(holdings: &[Holding]) -> Vec<Holding> {
    let mut merged: Vec<(Holding, usize)> = Vec::new();

    for h in holdings {
        let cost = h.buy_price.unwrap_or(0.0);
        match merged.iter_mut().find(|(m, _)| m.ticker == h.ticker) {
            Some((m, count)) => {
                m.quantity += h.quantity;
                let total = m.buy_price.unwrap_or(0.0) * *count as f64 + cost;
                *count += 1;
                m.buy_price = Some(total / *count as f64);
            }
            None => merged.push((
                Holding {
                    ticker: h.ticker.clone(),
                    quantity: h.quantity,
                    buy_price: Some(cost),
                },
                1,
            )),
        }
    }

    merged.into_iter().map(|(h, _)| h).collect()
}

/// Valuation of one aggregated position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionValuation {
    pub ticker: String,
    pub quantity: f64,
    pub avg_cost: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub daily_change_pct: f64,
    /// Value change since the previous close
    pub daily_change: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    /// Set when no price could be fetched; the numbers are then zero
    pub error: Option<String>,
}

impl PositionValuation {
    fn unpriced(holding: &Holding, error: impl Into<String>) -> Self {
        Self {
            ticker: holding.ticker.clone(),
            quantity: holding.quantity,
            avg_cost: holding.buy_price.unwrap_or(0.0),
            current_price: 0.0,
            market_value: 0.0,
            daily_change_pct: 0.0,
            daily_change: 0.0,
            total_return: 0.0,
            total_return_pct: 0.0,
            error: Some(error.into()),
        }
    }
}

/// Totals across all priced positions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_cost: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    pub daily_change: f64,
}

/// Values holdings using daily closes from the client
pub struct PortfolioManager {
    client: MarketDataClient,
}

impl PortfolioManager {
    pub fn new(client: MarketDataClient) -> Self {
        Self { client }
    }

    /// Sample portfolio used when the user has entered nothing
    pub fn default_portfolio() -> Vec<Holding> {
        vec![
            Holding::new("AAPL", 10.0, Some(150.0)),
            Holding::new("TSLA", 5.0, Some(200.0)),
            Holding::new("BTC-USD", 0.5, Some(30_000.0)),
        ]
    }

    /// Values every position and totals the priced ones
    ///
    /// Positions are fetched concurrently; the client's rate limiter still
    /// spaces the upstream calls.
    pub async fn calculate(
        &self,
        holdings: &[Holding],
    ) -> (Vec<PositionValuation>, PortfolioSummary) {
        let positions = aggregate_holdings(holdings);
        let valuations = join_all(positions.iter().map(|h| self.value_position(h))).await;

        let mut summary = PortfolioSummary::default();
        for valuation in valuations.iter().filter(|v| v.error.is_none()) {
            summary.total_value += valuation.market_value;
            summary.total_cost += valuation.avg_cost * valuation.quantity;
            summary.daily_change += valuation.daily_change;
        }
        summary.total_return = summary.total_value - summary.total_cost;
        if summary.total_cost > 0.0 {
            summary.total_return_pct = summary.total_return / summary.total_cost * 100.0;
        }

        (valuations, summary)
    }

    async fn value_position(&self, holding: &Holding) -> PositionValuation {
        let history = self
            .client
            .fetch_history(&holding.ticker, Period::FiveDays, Interval::OneDay)
            .await;

        let Some((current, previous)) = history.as_deref().and_then(|h| last_two_closes(h)) else {
            tracing::error!(ticker = %holding.ticker, "No price data found");
            return PositionValuation::unpriced(holding, "No price data found");
        };

        let previous = previous.unwrap_or(current);
        let avg_cost = holding.buy_price.unwrap_or(0.0);
        let market_value = current * holding.quantity;
        let daily_change_pct = if previous != 0.0 {
            (current - previous) / previous * 100.0
        } else {
            0.0
        };
        let total_return_pct = if avg_cost > 0.0 {
            (current - avg_cost) / avg_cost * 100.0
        } else {
            0.0
        };

        PositionValuation {
            ticker: holding.ticker.clone(),
            quantity: holding.quantity,
            avg_cost,
            current_price: current,
            market_value,
            daily_change_pct,
            daily_change: (current - previous) * holding.quantity,
            total_return: market_value - avg_cost * holding.quantity,
            total_return_pct,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketDataConfig;
    use crate::provider::mock::{bars, MockProvider};
    use std::sync::Arc;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_holdings() {
        let holdings = parse_holdings(" aapl = 10 @ 150, btc-usd=0.5,, junk, TSLA=x, MSFT=2@y ");
        assert_eq!(
            holdings,
            vec![
                Holding::new("AAPL", 10.0, Some(150.0)),
                Holding::new("BTC-USD", 0.5, None),
            ]
        );
    }

    #[test]
    fn test_parse_holding_errors() {
        assert!(matches!(
            parse_holding("=5"),
            Err(ParseError::InvalidHolding { .. })
        ));
        assert!(parse_holding("AAPL").is_err());
        assert_eq!(
            parse_holding("nvda=3@400.5").unwrap(),
            Holding::new("NVDA", 3.0, Some(400.5))
        );
    }

    #[test]
    fn test_aggregate_holdings() {
        let merged = aggregate_holdings(&[
            Holding::new("AAPL", 10.0, Some(100.0)),
            Holding::new("TSLA", 1.0, Some(200.0)),
            Holding::new("AAPL", 5.0, Some(200.0)),
        ]);
        assert_eq!(
            merged,
            vec![
                Holding::new("AAPL", 15.0, Some(150.0)),
                Holding::new("TSLA", 1.0, Some(200.0)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_calculate_portfolio() {
        let mock = Arc::new(MockProvider::new());
        mock.push_history("AAPL", Period::FiveDays, Interval::OneDay, Ok(bars(&[100.0, 200.0])));
        mock.push_history("TSLA", Period::FiveDays, Interval::OneDay, Ok(bars(&[250.0])));
        mock.push_history("DEAD", Period::FiveDays, Interval::OneDay, Ok(vec![]));
        let client = MarketDataClient::with_provider(mock, MarketDataConfig::default());
        let manager = PortfolioManager::new(client);

        let (rows, summary) = manager
            .calculate(&[
                Holding::new("AAPL", 10.0, Some(150.0)),
                Holding::new("TSLA", 2.0, Some(200.0)),
                Holding::new("DEAD", 1.0, Some(10.0)),
            ])
            .await;

        assert_eq!(rows.len(), 3);
        let aapl = &rows[0];
        assert!(close(aapl.market_value, 2000.0));
        assert!(close(aapl.daily_change_pct, 100.0));
        assert!(close(aapl.daily_change, 1000.0));
        assert!(close(aapl.total_return, 500.0));
        assert!(close(aapl.total_return_pct, 100.0 / 3.0));

        let tsla = &rows[1];
        assert!(close(tsla.daily_change_pct, 0.0));
        assert!(close(tsla.market_value, 500.0));

        let dead = &rows[2];
        assert_eq!(dead.error.as_deref(), Some("No price data found"));
        assert_eq!(dead.market_value, 0.0);

        assert!(close(summary.total_value, 2500.0));
        assert!(close(summary.total_cost, 1900.0));
        assert!(close(summary.total_return, 600.0));
        assert!(close(summary.total_return_pct, 600.0 / 1900.0 * 100.0));
        assert!(close(summary.daily_change, 1000.0));
    }

    #[tokio::test]
    async fn test_empty_portfolio() {
        let mock = Arc::new(MockProvider::new());
        let client = MarketDataClient::with_provider(mock, MarketDataConfig::default());
        let (rows, summary) = PortfolioManager::new(client).calculate(&[]).await;
        assert!(rows.is_empty());
        assert_eq!(summary, PortfolioSummary::default());
        assert_eq!(PortfolioManager::default_portfolio().len(), 3);
    }
}
