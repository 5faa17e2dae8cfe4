//! Market data source trait and request/response types.
//!
//! The dashboard and the ranker only talk to the outside world through
//! [`MarketDataSource`]. Two endpoints are needed:
//!
//! | Endpoint | Request | Response | Description |
//! |----------|---------|----------|-------------|
//! | History | [`HistoryRequest`] | [`PriceSeries`] | OHLCV bars for a date window |
//! | Snapshot | [`Symbol`] | [`MarketSnapshot`] | Point-in-time fundamentals and price |
//!
//! An empty history is not an error at this layer: the caller decides whether
//! "no bars" means retry, skip or "not available".

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::calendar::{format_date, iso_date};
use crate::range::ResolvedRange;
use crate::{Interval, MarketSnapshot, PriceSeries, ProviderId, Symbol};

/// Boxed future returned by data source methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    NotFound,
    Internal,
}

/// Structured source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for the history endpoint. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
    pub interval: Interval,
}

impl HistoryRequest {
    pub fn new(
        symbol: Symbol,
        start: Date,
        end: Date,
        interval: Interval,
    ) -> Result<Self, SourceError> {
        if end < start {
            return Err(SourceError::invalid_request(format!(
                "history window end {} is before start {}",
                format_date(end),
                format_date(start)
            )));
        }
        Ok(Self {
            symbol,
            start,
            end,
            interval,
        })
    }

    pub fn for_range(symbol: Symbol, range: ResolvedRange) -> Result<Self, SourceError> {
        Self::new(symbol, range.start, range.end, range.interval)
    }
}

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`: the ranker shares one source across
/// its worker tasks.
pub trait MarketDataSource: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches OHLCV bars for `[start, end)` at the requested interval.
    ///
    /// Returns an empty series when the window holds no trading sessions.
    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, PriceSeries>;

    /// Fetches the point-in-time snapshot for one ticker.
    fn snapshot<'a>(&'a self, symbol: Symbol) -> SourceFuture<'a, MarketSnapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn history_request_rejects_reversed_window() {
        let symbol = Symbol::parse("AAPL").expect("valid");
        let err = HistoryRequest::new(
            symbol,
            date!(2024 - 02 - 01),
            date!(2024 - 01 - 01),
            Interval::OneDay,
        )
        .expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::InvalidRequest);
        assert!(err.message().contains("before start"));
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(SourceError::unavailable("x").code(), "source.unavailable");
        assert_eq!(SourceError::not_found("x").code(), "source.not_found");
        assert!(SourceError::rate_limited("x").retryable());
        assert!(!SourceError::internal("x").retryable());
    }
}
