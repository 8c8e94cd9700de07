//! Error types for the market data access layer

use thiserror::Error;

/// Faults an upstream provider can report for a single call
///
/// These never cross the `MarketDataClient` boundary; the client turns them
/// into retries or an absent result.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded (429 Too Many Requests)")]
    RateLimitExceeded,

    /// Ticker not known to this provider
    #[error("Ticker not supported: {0}")]
    UnsupportedTicker(String),

    /// Provider API error
    #[error("Provider API error: {0}")]
    ApiError(String),

    /// Non-success HTTP status; the body is kept for debugging only
    #[error("HTTP {status}")]
    HttpStatus { status: u16, body: String },

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,
}

impl ProviderError {
    /// Creates an ApiError
    pub fn api(msg: impl Into<String>) -> Self {
        Self::ApiError(msg.into())
    }

    /// Creates an InvalidResponse error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Creates an HttpStatus error, truncating the body
    pub fn http(status: u16, body: &str) -> Self {
        Self::HttpStatus {
            status,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }

    /// True when the fault is the upstream throttling us
    ///
    /// Decided from the status code where there is one. Upstream error
    /// text (`ApiError`) counts when it carries `Too Many Requests` or a
    /// `429` status token (`HTTP 429`, `status 429`, `code 429`, or a
    /// leading `429`). Response bodies and parse errors are never scanned.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::RateLimitExceeded => true,
            Self::HttpStatus { status, .. } => *status == 429,
            Self::NetworkError(e) => e.status().is_some_and(|s| s.as_u16() == 429),
            Self::ApiError(msg) => has_rate_limit_marker(msg),
            Self::InvalidResponse(_) | Self::UnsupportedTicker(_) | Self::Timeout => false,
        }
    }
}

/// Longest response body kept on an `HttpStatus` error
const MAX_ERROR_BODY_CHARS: usize = 200;

fn has_rate_limit_marker(msg: &str) -> bool {
    if msg.to_ascii_lowercase().contains("too many requests") {
        return true;
    }

    let tokens: Vec<&str> = msg
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.first() == Some(&"429") {
        return true;
    }
    tokens.windows(2).any(|pair| {
        pair[1] == "429"
            && matches!(
                pair[0].to_ascii_lowercase().as_str(),
                "http" | "status" | "code"
            )
    })
}

/// Errors raised while loading `MarketDataConfig`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    /// Unknown provider name
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

impl ConfigError {
    pub fn invalid_value(key: &str, value: &str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Errors raised while parsing user supplied text (periods, holdings)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown period: {0}")]
    UnknownPeriod(String),

    #[error("Unknown interval: {0}")]
    UnknownInterval(String),

    #[error("Invalid holding {entry:?}: {reason}")]
    InvalidHolding { entry: String, reason: String },

    #[error("Empty symbol")]
    EmptySymbol,
}
