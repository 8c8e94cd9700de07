//! Market data provider implementations

pub mod coingecko;
pub mod failover;
pub mod yahoo;

pub use coingecko::CoinGeckoProvider;
pub use failover::FailoverProvider;
pub use yahoo::YahooProvider;
