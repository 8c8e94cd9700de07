//! Types for the market data access layer

use crate::constants::{IDENTITY_FIELDS, PRICE_FIELDS};
use crate::error::ParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Look-back window for a history query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    /// Provider-facing range string (`1d`, `5d`, `1mo`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }

    /// Approximate number of calendar days covered, for day-based APIs
    ///
    /// `None` means "everything the provider has".
    pub fn approx_days(&self) -> Option<u32> {
        match self {
            Period::OneDay => Some(1),
            Period::FiveDays => Some(5),
            Period::OneMonth => Some(30),
            Period::ThreeMonths => Some(90),
            Period::SixMonths => Some(180),
            Period::OneYear => Some(365),
            Period::TwoYears => Some(730),
            Period::FiveYears => Some(1825),
            Period::TenYears => Some(3650),
            Period::YearToDate => {
                use chrono::Datelike;
                Some(Utc::now().ordinal())
            }
            Period::Max => None,
        }
    }

    pub fn all() -> &'static [Period] {
        &[
            Period::OneDay,
            Period::FiveDays,
            Period::OneMonth,
            Period::ThreeMonths,
            Period::SixMonths,
            Period::OneYear,
            Period::TwoYears,
            Period::FiveYears,
            Period::TenYears,
            Period::YearToDate,
            Period::Max,
        ]
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Period::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or(ParseError::UnknownPeriod(s))
    }
}

/// Bar width for a history query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "2m")]
    TwoMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "60m")]
    SixtyMinutes,
    #[serde(rename = "90m")]
    NinetyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1wk")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::TwoMinutes => "2m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::SixtyMinutes => "60m",
            Interval::NinetyMinutes => "90m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::FiveDays => "5d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
            Interval::ThreeMonths => "3mo",
        }
    }

    pub fn all() -> &'static [Interval] {
        &[
            Interval::OneMinute,
            Interval::TwoMinutes,
            Interval::FiveMinutes,
            Interval::FifteenMinutes,
            Interval::ThirtyMinutes,
            Interval::SixtyMinutes,
            Interval::NinetyMinutes,
            Interval::OneHour,
            Interval::OneDay,
            Interval::FiveDays,
            Interval::OneWeek,
            Interval::OneMonth,
            Interval::ThreeMonths,
        ]
    }

    /// True for bars shorter than a trading day
    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Interval::OneMinute
                | Interval::TwoMinutes
                | Interval::FiveMinutes
                | Interval::FifteenMinutes
                | Interval::ThirtyMinutes
                | Interval::SixtyMinutes
                | Interval::NinetyMinutes
                | Interval::OneHour
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Interval::all()
            .iter()
            .copied()
            .find(|i| i.as_str() == s)
            .ok_or(ParseError::UnknownInterval(s))
    }
}

/// Flat mapping of named info fields for a ticker
///
/// Field names follow the upstream's camelCase convention
/// (`currentPrice`, `longName`, `marketCap`, ...). Values are kept as raw
/// JSON so fields the layer does not know about pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickerInfo(Map<String, Value>);

impl TickerInfo {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Numeric field value, if present and numeric
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Sets a field, returning the previous value
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// True when any of the price-bearing fields holds a non-null value
    pub fn has_price(&self) -> bool {
        PRICE_FIELDS
            .iter()
            .any(|f| self.0.get(*f).is_some_and(|v| !v.is_null()))
    }

    /// True when a non-empty name or symbol is present
    pub fn has_identity(&self) -> bool {
        IDENTITY_FIELDS.iter().any(|f| match self.0.get(*f) {
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Null) | None => false,
            Some(_) => true,
        })
    }

    /// First numeric price found, in `PRICE_FIELDS` order
    pub fn price(&self) -> Option<f64> {
        PRICE_FIELDS.iter().find_map(|f| self.get_f64(f))
    }
}

impl From<Map<String, Value>> for TickerInfo {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One OHLC + volume record of a history series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Bar for sources that only report a closing price
    pub fn close_only(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }
}

/// Time-ordered history series, oldest bar first
pub type History = Vec<Bar>;

/// Closing price of the last bar and of the one before it, if any
pub fn last_two_closes(history: &[Bar]) -> Option<(f64, Option<f64>)> {
    let (last, rest) = history.split_last()?;
    Some((last.close, rest.last().map(|b| b.close)))
}

/// What a cached payload answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Info,
    History { period: Period, interval: Interval },
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Info => f.write_str("info"),
            QueryKind::History { period, interval } => write!(f, "history({period}, {interval})"),
        }
    }
}

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Upstream calls are succeeding
    Healthy,
    /// Some upstream calls are failing
    Degraded,
    /// Most upstream calls are failing
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}
